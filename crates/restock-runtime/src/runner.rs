//! Generic runner hosting one or more bots.

use std::sync::Arc;

use restock_models::InboundMessage;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::bot::{Bot, STATUS_COMMAND};
use crate::error::{Result, RuntimeError};
use crate::transport::MessageSource;

/// Spawn a task that calls `bot.poll()` every `bot.poll_interval()` until
/// `shutdown` flips to true. The first poll fires immediately.
pub(crate) fn spawn_poll_loop(
    bot: Arc<dyn Bot>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<JoinHandle<()>> {
    let period = bot.poll_interval();
    if period.is_zero() {
        return Err(RuntimeError::InvalidInterval(bot.name().to_string()));
    }

    Ok(tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!(bot = %bot.name(), poll_interval_ms = period.as_millis(), "starting poll loop");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    bot.poll().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!(bot = %bot.name(), "poll loop received shutdown signal");
                        break;
                    }
                }
            }
        }

        debug!(bot = %bot.name(), "poll loop stopped");
    }))
}

/// Work out which bots an inbound message is for.
///
/// `status` goes to every bot; `<name> <command>` goes to the named bot
/// only. Anything else matches nothing.
pub fn route<'a>(bots: &'a [Arc<dyn Bot>], msg: &InboundMessage) -> Vec<(&'a Arc<dyn Bot>, String)> {
    let command = msg.command();
    if command.is_empty() {
        return Vec::new();
    }

    if command == STATUS_COMMAND {
        return bots.iter().map(|b| (b, command.clone())).collect();
    }

    let (target, rest) = match command.split_once(char::is_whitespace) {
        Some((target, rest)) => (target, rest.trim()),
        None => (command.as_str(), ""),
    };
    bots.iter()
        .filter(|b| b.name() == target)
        .map(|b| (b, rest.to_string()))
        .collect()
}

/// Deliver `msg` to every bot it routes to. Returns how many bots handled it.
pub async fn dispatch(bots: &[Arc<dyn Bot>], msg: &InboundMessage) -> usize {
    let mut handled = 0;
    for (bot, command) in route(bots, msg) {
        if bot.handle_command(&msg.sender, &command).await {
            handled += 1;
        } else {
            debug!(bot = %bot.name(), command = %command, "command not recognized");
        }
    }
    if handled == 0 {
        debug!(sender = %msg.sender, "ignoring inbound message");
    }
    handled
}

async fn receive_loop(
    bots: Vec<Arc<dyn Bot>>,
    mut source: Box<dyn MessageSource>,
    mut shutdown: watch::Receiver<bool>,
) {
    debug!("starting receive loop");

    loop {
        tokio::select! {
            msg = source.receive() => {
                match msg {
                    Some(msg) => {
                        dispatch(&bots, &msg).await;
                    }
                    None => {
                        info!("message source closed");
                        break;
                    }
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    debug!("receive loop received shutdown signal");
                    break;
                }
            }
        }
    }

    debug!("receive loop stopped");
}

/// Hosts bots: one poll timer per bot plus a shared inbound message loop.
pub struct Runner {
    bots: Vec<Arc<dyn Bot>>,
    source: Option<Box<dyn MessageSource>>,
    handles: Vec<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    started: bool,
}

impl Runner {
    /// Create a runner reading inbound messages from `source`.
    pub fn new(source: impl MessageSource + 'static) -> Self {
        let source: Box<dyn MessageSource> = Box::new(source);
        let mut runner = Self::without_source();
        runner.source = Some(source);
        runner
    }

    /// Create a runner that only polls.
    pub fn without_source() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            bots: Vec::new(),
            source: None,
            handles: Vec::new(),
            shutdown_tx,
            shutdown_rx,
            started: false,
        }
    }

    /// Register a bot. Must happen before `start`.
    pub fn add_bot(&mut self, bot: Arc<dyn Bot>) -> Result<()> {
        if self.started {
            return Err(RuntimeError::AlreadyStarted);
        }
        if bot.poll_interval().is_zero() {
            return Err(RuntimeError::InvalidInterval(bot.name().to_string()));
        }
        info!(bot = %bot.name(), "registered bot");
        self.bots.push(bot);
        Ok(())
    }

    pub fn bots(&self) -> &[Arc<dyn Bot>] {
        &self.bots
    }

    /// Spawn the poll timers and the receive loop.
    pub fn start(&mut self) -> Result<()> {
        if self.started {
            return Err(RuntimeError::AlreadyStarted);
        }

        info!(bots = self.bots.len(), "starting runner");
        self.shutdown_tx.send_replace(false);

        for bot in &self.bots {
            let handle = spawn_poll_loop(Arc::clone(bot), self.shutdown_rx.clone())?;
            self.handles.push(handle);
        }

        match self.source.take() {
            Some(source) => {
                let bots = self.bots.clone();
                let shutdown = self.shutdown_rx.clone();
                self.handles
                    .push(tokio::spawn(receive_loop(bots, source, shutdown)));
            }
            None => warn!("no message source; inbound commands disabled"),
        }

        self.started = true;
        Ok(())
    }

    /// Signal every task to stop and wait for them.
    pub async fn shutdown(&mut self) -> Result<()> {
        if !self.started {
            return Err(RuntimeError::NotStarted);
        }

        info!("shutting down runner");
        self.shutdown_tx.send_replace(true);

        let mut first_error = None;
        for handle in self.handles.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "runner task panicked");
                first_error.get_or_insert_with(|| format!("task panicked: {}", e));
            }
        }

        self.started = false;
        info!("runner stopped");

        match first_error {
            Some(e) => Err(RuntimeError::Shutdown(e)),
            None => Ok(()),
        }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        if self.started {
            self.shutdown_tx.send_replace(true);
        }
    }
}
