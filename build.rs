//! Build stamp for `demburn version`.
//!
//! Honours `SOURCE_DATE_EPOCH` so packaged builds are reproducible.

use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

const STAMP: &[FormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second] UTC");

fn build_time() -> OffsetDateTime {
    std::env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
        .unwrap_or_else(OffsetDateTime::now_utc)
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");

    let stamp = build_time()
        .format(STAMP)
        .unwrap_or_else(|_| "unknown".to_string());
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());
    let target = std::env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=DEMBURN_BUILD_STAMP={}", stamp);
    println!("cargo:rustc-env=DEMBURN_BUILD_PROFILE={}", profile);
    println!("cargo:rustc-env=DEMBURN_TARGET={}", target);
}
