//! Startup banner for the CLI.

use crate::consts::{AUTHOR, HOMEPAGE, REPO};

/// Session configuration for display in the startup banner.
pub struct BannerInfo<'a> {
    pub endpoint: &'a str,
    pub mode: &'a str,
    pub destination: &'a str,
    pub deadline_secs: u64,
}

/// Print the startup banner with session info.
pub fn print_banner(info: &BannerInfo) {
    println!(
        r#"
   ╔═══════════════════════════════════════╗
   ║          W A Y F A R E R              ║
   ║   itineraries, one poll at a time     ║
   ╚═══════════════════════════════════════╝

   version      {}
   by           {}
   home         {}
   repo         {}
   backend      {} ({})
   destination  {}
   deadline     {}s
"#,
        env!("CARGO_PKG_VERSION"),
        AUTHOR,
        HOMEPAGE,
        REPO,
        info.endpoint,
        info.mode,
        info.destination,
        info.deadline_secs,
    );
}
