//! Show a written file in the platform file manager

use std::io;
use std::path::Path;
use std::process::Command;

/// Open the file manager with `path` selected where the platform allows it,
/// otherwise its containing folder
pub fn reveal_in_file_manager(path: &Path) -> io::Result<()> {
    #[cfg(target_os = "windows")]
    {
        let mut select = std::ffi::OsString::from("/select,");
        select.push(path.as_os_str());
        Command::new("explorer").arg(select).spawn()?;
    }

    #[cfg(target_os = "macos")]
    {
        Command::new("open").arg("-R").arg(path).spawn()?;
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        Command::new("xdg-open").arg(dir).spawn()?;
    }

    Ok(())
}
