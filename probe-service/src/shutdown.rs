//! Shutdown coordination.
//!
//! A `ShutdownCoordinator` is created once during initialization. Signal
//! listeners and programmatic callers trigger it with a reason; the first
//! trigger wins. The server waits on it, drains in-flight requests for a
//! bounded time, and the reason decides the process exit code. Any further
//! trigger forces the drain to be skipped.

use std::fmt;

use chrono::Utc;
use tokio::sync::watch;

/// Termination signals the service listens for.
///
/// SIGPIPE is deliberately absent. SIGILL, SIGFPE and SIGSEGV are refused by
/// tokio and keep their default disposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    Hangup,
    Interrupt,
    Quit,
    Trap,
    Abort,
    Bus,
    User1,
    User2,
    Terminate,
}

impl TerminationSignal {
    #[cfg(unix)]
    pub const ALL: [TerminationSignal; 9] = [
        TerminationSignal::Hangup,
        TerminationSignal::Interrupt,
        TerminationSignal::Quit,
        TerminationSignal::Trap,
        TerminationSignal::Abort,
        TerminationSignal::Bus,
        TerminationSignal::User1,
        TerminationSignal::User2,
        TerminationSignal::Terminate,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TerminationSignal::Hangup => "SIGHUP",
            TerminationSignal::Interrupt => "SIGINT",
            TerminationSignal::Quit => "SIGQUIT",
            TerminationSignal::Trap => "SIGTRAP",
            TerminationSignal::Abort => "SIGABRT",
            TerminationSignal::Bus => "SIGBUS",
            TerminationSignal::User1 => "SIGUSR1",
            TerminationSignal::User2 => "SIGUSR2",
            TerminationSignal::Terminate => "SIGTERM",
        }
    }

    #[cfg(unix)]
    fn kind(&self) -> tokio::signal::unix::SignalKind {
        use tokio::signal::unix::SignalKind;

        match self {
            TerminationSignal::Hangup => SignalKind::hangup(),
            TerminationSignal::Interrupt => SignalKind::interrupt(),
            TerminationSignal::Quit => SignalKind::quit(),
            TerminationSignal::Trap => SignalKind::from_raw(libc::SIGTRAP),
            TerminationSignal::Abort => SignalKind::from_raw(libc::SIGABRT),
            TerminationSignal::Bus => SignalKind::from_raw(libc::SIGBUS),
            TerminationSignal::User1 => SignalKind::user_defined1(),
            TerminationSignal::User2 => SignalKind::user_defined2(),
            TerminationSignal::Terminate => SignalKind::terminate(),
        }
    }
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why the server is going down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// A termination signal arrived; the process exits with status 1.
    Signal(TerminationSignal),
    /// Ordinary stop requested from inside the process.
    Exit,
}

impl ShutdownReason {
    /// Process exit status for this reason.
    pub fn exit_code(&self) -> u8 {
        match self {
            ShutdownReason::Signal(_) => 1,
            ShutdownReason::Exit => 0,
        }
    }
}

/// Cloneable handle for triggering and awaiting shutdown.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    sender: watch::Sender<Option<ShutdownReason>>,
    receiver: watch::Receiver<Option<ShutdownReason>>,
    forced: watch::Sender<bool>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(None);
        let (forced, _) = watch::channel(false);
        Self {
            sender,
            receiver,
            forced,
        }
    }

    /// Records `reason` unless a shutdown is already under way, in which case
    /// the drain is forced to end.
    ///
    /// Returns whether this call was the one that initiated shutdown.
    pub fn trigger(&self, reason: ShutdownReason) -> bool {
        let initiated = self.sender.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        });

        if initiated {
            match reason {
                ShutdownReason::Signal(signal) => tracing::warn!(
                    signal = %signal,
                    timestamp = %Utc::now().to_rfc2822(),
                    "Received {} - terminating probe service",
                    signal
                ),
                ShutdownReason::Exit => tracing::info!(
                    timestamp = %Utc::now().to_rfc2822(),
                    "Shutdown requested"
                ),
            }
        } else if !self.forced.send_replace(true) {
            tracing::warn!(
                timestamp = %Utc::now().to_rfc2822(),
                "Shutdown requested again - skipping the drain"
            );
        }
        initiated
    }

    /// Requests an ordinary stop.
    pub fn request_exit(&self) -> bool {
        self.trigger(ShutdownReason::Exit)
    }

    /// The recorded reason, if shutdown has begun.
    pub fn reason(&self) -> Option<ShutdownReason> {
        *self.receiver.borrow()
    }

    /// Resolves once shutdown has been triggered.
    pub async fn wait(&self) -> ShutdownReason {
        let mut receiver = self.receiver.clone();
        let reason = match receiver.wait_for(Option::is_some).await {
            Ok(reason) => *reason,
            // The sender lives inside `self`, so the channel cannot close here.
            Err(_) => None,
        };
        reason.unwrap_or(ShutdownReason::Exit)
    }

    /// Resolves once a second trigger has asked to skip the drain.
    pub async fn wait_forced(&self) {
        let mut receiver = self.forced.subscribe();
        // `self` owns the sender, so the channel cannot close here.
        let _ = receiver.wait_for(|forced| *forced).await;
    }

    pub fn is_forced(&self) -> bool {
        *self.forced.borrow()
    }

    /// Spawns one listener task per termination signal. Each task keeps
    /// listening, so a repeated signal forces an immediate stop.
    ///
    /// Must be called from within a tokio runtime.
    #[cfg(unix)]
    pub fn install_signal_handlers(&self) {
        use tokio::signal::unix::signal;

        for term in TerminationSignal::ALL {
            match signal(term.kind()) {
                Ok(mut stream) => {
                    let coordinator = self.clone();
                    tokio::spawn(async move {
                        while stream.recv().await.is_some() {
                            coordinator.trigger(ShutdownReason::Signal(term));
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(signal = %term, error = %e, "Failed to install signal handler");
                }
            }
        }
        tracing::debug!(count = TerminationSignal::ALL.len(), "Termination signal handlers installed");
    }

    /// Spawns a Ctrl+C listener.
    #[cfg(not(unix))]
    pub fn install_signal_handlers(&self) {
        let coordinator = self.clone();
        tokio::spawn(async move {
            loop {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        coordinator.trigger(ShutdownReason::Signal(TerminationSignal::Interrupt));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
                        break;
                    }
                }
            }
        });
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_signal_names() {
        assert_eq!(TerminationSignal::Terminate.to_string(), "SIGTERM");
        assert_eq!(TerminationSignal::Interrupt.to_string(), "SIGINT");
        assert_eq!(TerminationSignal::User2.name(), "SIGUSR2");
        assert_eq!(TerminationSignal::Trap.name(), "SIGTRAP");
        assert_eq!(TerminationSignal::Abort.name(), "SIGABRT");
        assert_eq!(TerminationSignal::Bus.name(), "SIGBUS");
    }

    #[cfg(unix)]
    #[test]
    fn test_fault_style_signals_map_to_raw_numbers() {
        assert_eq!(TerminationSignal::Trap.kind().as_raw_value(), libc::SIGTRAP);
        assert_eq!(TerminationSignal::Abort.kind().as_raw_value(), libc::SIGABRT);
        assert_eq!(TerminationSignal::Bus.kind().as_raw_value(), libc::SIGBUS);
        assert_eq!(TerminationSignal::ALL.len(), 9);
    }

    #[test]
    fn test_second_trigger_forces() {
        let coordinator = ShutdownCoordinator::new();
        coordinator.trigger(ShutdownReason::Signal(TerminationSignal::Interrupt));
        assert!(!coordinator.is_forced());

        coordinator.trigger(ShutdownReason::Signal(TerminationSignal::Interrupt));
        assert!(coordinator.is_forced());
        assert_eq!(
            coordinator.reason(),
            Some(ShutdownReason::Signal(TerminationSignal::Interrupt))
        );
    }

    #[tokio::test]
    async fn test_wait_forced_resolves_after_repeat() {
        let coordinator = ShutdownCoordinator::new();
        let waiter = coordinator.clone();
        let handle = tokio::spawn(async move { waiter.wait_forced().await });

        coordinator.request_exit();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!handle.is_finished());

        coordinator.request_exit();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ShutdownReason::Signal(TerminationSignal::Hangup).exit_code(), 1);
        assert_eq!(ShutdownReason::Exit.exit_code(), 0);
    }

    #[test]
    fn test_first_trigger_wins() {
        let coordinator = ShutdownCoordinator::new();
        assert_eq!(coordinator.reason(), None);

        assert!(coordinator.trigger(ShutdownReason::Signal(TerminationSignal::Terminate)));
        assert!(!coordinator.request_exit());

        assert_eq!(
            coordinator.reason(),
            Some(ShutdownReason::Signal(TerminationSignal::Terminate))
        );
    }

    #[tokio::test]
    async fn test_wait_resolves_for_clones() {
        let coordinator = ShutdownCoordinator::new();
        let waiter = coordinator.clone();
        let handle = tokio::spawn(async move { waiter.wait().await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        coordinator.request_exit();

        assert_eq!(handle.await.unwrap(), ShutdownReason::Exit);
    }

    #[tokio::test]
    async fn test_wait_after_trigger_returns_immediately() {
        let coordinator = ShutdownCoordinator::new();
        coordinator.trigger(ShutdownReason::Signal(TerminationSignal::Quit));
        assert_eq!(
            coordinator.wait().await,
            ShutdownReason::Signal(TerminationSignal::Quit)
        );
    }

    #[tokio::test]
    async fn test_install_signal_handlers_does_not_trigger() {
        let coordinator = ShutdownCoordinator::new();
        coordinator.install_signal_handlers();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(coordinator.reason(), None);
    }
}
