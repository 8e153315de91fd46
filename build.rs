//! Build-time hints for locating FFmpeg.
//!
//! `ffmpeg-sys-next` does the actual discovery. This only warns early when
//! a Windows build is likely to fail because no FFmpeg install is visible.

use std::{env, path::PathBuf};

const WATCHED_VARIABLES: [&str; 3] = ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_TRIPLET"];

fn main() {
    for variable in WATCHED_VARIABLES {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("windows")
        || env::var_os("FFMPEG_DIR").is_some()
    {
        return;
    }

    let Some(vcpkg_root) = env::var_os("VCPKG_ROOT") else {
        println!("cargo:warning=framesnap: set FFMPEG_DIR to an FFmpeg install before building on Windows.");
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let candidate = PathBuf::from(vcpkg_root).join("installed").join(triplet);
    if candidate.join("include").join("libavformat").exists() {
        println!(
            "cargo:warning=framesnap: found vcpkg FFmpeg at {}; set FFMPEG_DIR to use it.",
            candidate.display()
        );
    } else {
        println!(
            "cargo:warning=framesnap: no FFmpeg headers under {}.",
            candidate.display()
        );
    }
}
