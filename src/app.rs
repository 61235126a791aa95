//! App bootstrap: configuration, terminal setup and the async event loop.
//!
//! [`App`] owns the single [`Runtime`]. [`App::run`] puts the terminal into
//! raw mode and the alternate screen, feeds stdin bytes to the input parser,
//! runs one tick per frame, and restores the terminal however the loop ends.
//! [`App::headless`] skips the terminal for tests.

use std::time::Duration;

use crossterm::terminal;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::render::Driver;
use crate::runtime::{Runtime, RuntimeOptions};

const READ_BUFFER: usize = 1024;

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

/// Configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Terminal window title.
    pub title: Option<String>,
    /// Ticks per second for the event loop.
    pub fps: u32,
    /// Enable mouse reporting.
    pub mouse: bool,
    pub runtime: RuntimeOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: None,
            fps: 60,
            mouse: true,
            runtime: RuntimeOptions::default(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_mouse(mut self, mouse: bool) -> Self {
        self.mouse = mouse;
        self
    }

    pub fn with_runtime(mut self, runtime: RuntimeOptions) -> Self {
        self.runtime = runtime;
        self
    }

    /// Time between ticks. A zero `fps` is treated as 1.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.fps.max(1)
    }
}

// ---------------------------------------------------------------------------
// Raw mode
// ---------------------------------------------------------------------------

/// Raw mode for as long as the guard lives.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self, AppError> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(err) = terminal::disable_raw_mode() {
            warn!(error = %err, "could not leave raw mode");
        }
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    runtime: Runtime,
    config: AppConfig,
}

impl App {
    /// An app on the real terminal, sized to it.
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        let (width, height) = Driver::terminal_size()?;
        let mut runtime = Runtime::new(config.runtime.clone().with_size(width, height));
        runtime.attach_driver(Driver::stdout());
        Ok(Self { runtime, config })
    }

    /// An app without a terminal.
    pub fn headless(width: u16, height: u16) -> Self {
        let config = AppConfig::new().with_runtime(RuntimeOptions::new().with_size(width, height));
        Self {
            runtime: Runtime::new(config.runtime.clone()),
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut Runtime {
        &mut self.runtime
    }

    pub fn has_driver(&self) -> bool {
        self.runtime.has_driver()
    }

    /// Run on stdin until quit is requested or input ends.
    pub async fn run(&mut self) -> Result<(), AppError> {
        self.run_with_input(tokio::io::stdin()).await
    }

    /// Run on any byte source. With a driver attached the terminal is set up
    /// first and restored on every exit path.
    pub async fn run_with_input<R: AsyncRead + Unpin>(&mut self, input: R) -> Result<(), AppError> {
        let _raw = if self.has_driver() { Some(RawModeGuard::enable()?) } else { None };
        if let Err(err) = self.enter_terminal() {
            self.leave_terminal();
            return Err(err);
        }
        info!(fps = self.config.fps, mouse = self.config.mouse, "app started");
        let result = self.event_loop(input).await;
        self.leave_terminal();
        info!(frames = self.runtime.frames_rendered(), "app stopped");
        result
    }

    fn enter_terminal(&mut self) -> Result<(), AppError> {
        let mouse = self.config.mouse;
        let title = self.config.title.clone();
        if let Some(driver) = self.runtime.driver_mut() {
            driver.enter(mouse)?;
            if let Some(title) = title {
                driver.set_title(&title)?;
            }
        }
        self.runtime.force_full_repaint();
        Ok(())
    }

    fn leave_terminal(&mut self) {
        if let Some(driver) = self.runtime.driver_mut() {
            if let Err(err) = driver.leave() {
                warn!(error = %err, "could not restore terminal");
            }
        }
    }

    async fn event_loop<R: AsyncRead + Unpin>(&mut self, mut input: R) -> Result<(), AppError> {
        let mut buf = [0u8; READ_BUFFER];
        let mut ticker = tokio::time::interval(self.config.frame_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut input_open = true;
        self.runtime.request_render();

        while !self.runtime.should_quit() {
            tokio::select! {
                read = input.read(&mut buf), if input_open => match read {
                    Ok(0) => {
                        debug!("input closed");
                        input_open = false;
                        self.runtime.flush_input();
                        self.runtime.run_until_idle();
                        break;
                    }
                    Ok(n) => self.runtime.feed_bytes(&buf[..n]),
                    Err(err) => return Err(err.into()),
                },
                _ = ticker.tick() => {
                    self.runtime.flush_input();
                    self.poll_resize();
                    self.runtime.run_tick();
                }
            }
        }
        Ok(())
    }

    fn poll_resize(&mut self) {
        if !self.has_driver() {
            return;
        }
        match Driver::terminal_size() {
            Ok((width, height)) => self.runtime.resize(width, height),
            Err(err) => warn!(error = %err, "could not read terminal size"),
        }
    }
}
