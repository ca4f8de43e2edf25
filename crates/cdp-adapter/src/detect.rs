use std::env;
use std::path::PathBuf;

use which::which;

/// Locate a Chrome/Chromium binary: `SHARECODE_CHROME`, then `PATH`, then
/// the usual install locations.
pub fn detect_chrome_executable() -> Option<PathBuf> {
    if let Ok(raw) = env::var("SHARECODE_CHROME") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let candidate = PathBuf::from(trimmed);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    for name in chrome_executable_names() {
        if let Ok(path) = which(name) {
            return Some(path);
        }
    }

    let skip_defaults = env::var("SHARECODE_SKIP_OS_PATHS")
        .map(|value| !value.trim().is_empty())
        .unwrap_or(false);
    if skip_defaults {
        return None;
    }
    os_specific_chrome_paths()
        .into_iter()
        .find(|candidate| candidate.exists())
}

fn chrome_executable_names() -> &'static [&'static str] {
    #[cfg(target_os = "windows")]
    {
        &["chrome.exe", "chromium.exe", "msedge.exe"]
    }

    #[cfg(not(target_os = "windows"))]
    {
        &[
            "google-chrome-stable",
            "google-chrome",
            "chromium",
            "chromium-browser",
        ]
    }
}

fn os_specific_chrome_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        ["PROGRAMFILES", "PROGRAMFILES(X86)", "LOCALAPPDATA"]
            .iter()
            .filter_map(|key| env::var(key).ok())
            .map(|root| PathBuf::from(root.trim()))
            .flat_map(|root| {
                [
                    root.join("Google/Chrome/Application/chrome.exe"),
                    root.join("Chromium/Application/chrome.exe"),
                ]
            })
            .collect()
    }

    #[cfg(target_os = "macos")]
    {
        vec![
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"),
            PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium"),
        ]
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        vec![
            PathBuf::from("/usr/bin/google-chrome-stable"),
            PathBuf::from("/usr/bin/google-chrome"),
            PathBuf::from("/usr/bin/chromium-browser"),
            PathBuf::from("/usr/bin/chromium"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    #[serial]
    fn env_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("my-chrome");
        fs::write(&exe, b"").unwrap();

        let original = env::var("SHARECODE_CHROME").ok();
        env::set_var("SHARECODE_CHROME", exe.to_string_lossy().to_string());
        let detected = detect_chrome_executable();
        match original {
            Some(value) => env::set_var("SHARECODE_CHROME", value),
            None => env::remove_var("SHARECODE_CHROME"),
        }
        assert_eq!(detected, Some(exe));
    }
}
