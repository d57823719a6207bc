//! Terminal display surface

use tokio::{
    io::{self, AsyncWrite, AsyncWriteExt},
    sync::watch,
};
use tracing::{info, warn};

/// Render each display update over the previous one on stdout
pub async fn display_task(display_rx: watch::Receiver<String>, shutdown_rx: watch::Receiver<bool>) {
    info!("Starting terminal display");

    if let Err(e) = render_display(display_rx, shutdown_rx, io::stdout()).await {
        warn!("Terminal display stopped: {}", e);
    }
}

/// Write every value seen on `display_rx` to `out` as a carriage-return line.
///
/// Once `shutdown_rx` turns true or the display sender is gone, the last value
/// is written, the line is terminated and the writer is returned.
pub async fn render_display<W>(
    mut display_rx: watch::Receiver<String>,
    mut shutdown_rx: watch::Receiver<bool>,
    mut out: W,
) -> io::Result<W>
where
    W: AsyncWrite + Unpin,
{
    loop {
        let current = display_rx.borrow_and_update().clone();
        write_line(&mut out, &current).await?;

        let finished = tokio::select! {
            changed = display_rx.changed() => changed.is_err(),
            _ = shutdown_rx.wait_for(|done| *done) => true,
        };

        if finished {
            let last = display_rx.borrow().clone();
            write_line(&mut out, &last).await?;
            out.write_all(b"\n").await?;
            out.flush().await?;
            return Ok(out);
        }
    }
}

async fn write_line<W>(out: &mut W, display: &str) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let line = format!("\r{:<10}", display);
    out.write_all(line.as_bytes()).await?;
    out.flush().await
}
