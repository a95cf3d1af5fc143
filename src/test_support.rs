//! Fake body sources shared by the unit tests.

use crate::probes::BodySource;
use crate::routing::Route;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Returns canned bodies and counts how often it was asked.
#[derive(Debug, Default)]
pub struct FixedBodies {
    calls: AtomicUsize,
}

impl FixedBodies {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl BodySource for FixedBodies {
    fn fetch(&self, route: Route) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let body = match route {
            Route::RamInfo => "MemTotal:       1024 kB\nMemFree:         512 kB\n",
            Route::SysInfo => "Linux testhost 6.1.0 x86_64 GNU/Linux\n",
            Route::LoadAvg => "Server Load Average:\n 1 min: 0.10\n 5 min: 0.20\n15 min: 0.30\n",
            Route::Time => "2024-01-01 00:00:00 (UTC)",
            Route::DiskUsage => {
                "Filesystem      Size  Used Avail Use% Mounted on\n/dev/sda1        50G   20G   28G  42% /\n"
            }
        };
        body.to_string()
    }
}
