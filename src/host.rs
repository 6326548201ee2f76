// Host seams used by the components: repaint requests and opening links.
// The components never talk to egui directly; the app wires these to the real host.

use eframe::egui;

/// Asks the host to paint another frame after component state changed.
pub trait RedrawSignal: Send + Sync {
    fn request_redraw(&self);
}

impl RedrawSignal for egui::Context {
    fn request_redraw(&self) {
        self.request_repaint();
    }
}

/// Redraw sink for components that are not attached to a window.
#[cfg(test)]
pub struct NoRedraw;

#[cfg(test)]
impl RedrawSignal for NoRedraw {
    fn request_redraw(&self) {}
}

/// Hands a URL to something outside the app (browser, download manager).
pub trait LinkOpener: Send + Sync {
    fn open(&self, url: &str);
}

/// Opens URLs in the system default browser.
pub struct SystemBrowser;

impl LinkOpener for SystemBrowser {
    fn open(&self, url: &str) {
        log::info!("Opening {url} in the default browser");
        // Spawned without a shell
        #[cfg(target_os = "windows")]
        let spawned = std::process::Command::new("explorer").arg(url).spawn();
        #[cfg(target_os = "macos")]
        let spawned = std::process::Command::new("open").arg(url).spawn();
        #[cfg(all(unix, not(target_os = "macos")))]
        let spawned = std::process::Command::new("xdg-open").arg(url).spawn();

        if let Err(e) = spawned {
            log::error!("Failed to open browser for {}: {}", url, e);
        }
    }
}
