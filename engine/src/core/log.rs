//! Log capture for engine hosts.
//!
//! The engine reports through the [`log`] facade. [`ChannelLogger`] is a [`log::Log`]
//! implementation that forwards records over a crossbeam channel so an editor, console or test
//! can collect them instead of printing.

use crossbeam::channel::{Receiver, Sender, unbounded};
use log::{Level, LevelFilter, Metadata, Record};

/// A single captured log record.
#[derive(Debug, Clone)]
pub struct LogMessage {
    pub level: Level,
    pub target: String,
    pub message: String,
}

pub struct ChannelLogger {
    sender: Sender<LogMessage>,
    max_level: LevelFilter,
}

impl log::Log for ChannelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            // A dropped receiver just means nobody is listening anymore.
            let _ = self.sender.try_send(LogMessage {
                level: record.metadata().level(),
                target: record.target().to_string(),
                message: format!("{}", record.args()),
            });
        }
    }

    fn flush(&self) {}
}

impl ChannelLogger {
    pub fn new(sender: Sender<LogMessage>, max_level: LevelFilter) -> Self {
        Self { sender, max_level }
    }

    /// Create a logger paired with the receiving end of its channel.
    pub fn with_receiver(max_level: LevelFilter) -> (Self, Receiver<LogMessage>) {
        let (sender, receiver) = unbounded();
        (Self::new(sender, max_level), receiver)
    }

    /// Install this logger as the global [`log`] sink.
    ///
    /// Fails if another logger was already installed for the process.
    pub fn install(self) -> Result<(), log::SetLoggerError> {
        let max_level = self.max_level;
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(max_level);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use log::Log;

    use super::*;

    #[test]
    fn forwards_enabled_records() {
        // Given
        let (logger, receiver) = ChannelLogger::with_receiver(LevelFilter::Debug);

        // When
        logger.log(
            &Record::builder()
                .level(Level::Debug)
                .target("blaze_engine::ecs")
                .args(format_args!("registered {}", "Position"))
                .build(),
        );

        // Then
        let message = receiver.try_recv().unwrap();
        assert_eq!(message.level, Level::Debug);
        assert_eq!(message.target, "blaze_engine::ecs");
        assert_eq!(message.message, "registered Position");
    }

    #[test]
    fn filters_records_above_max_level() {
        // Given
        let (logger, receiver) = ChannelLogger::with_receiver(LevelFilter::Info);

        // When
        logger.log(
            &Record::builder()
                .level(Level::Trace)
                .args(format_args!("dispatch"))
                .build(),
        );

        // Then
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn dropped_receiver_is_ignored() {
        // Given
        let (logger, receiver) = ChannelLogger::with_receiver(LevelFilter::Warn);
        drop(receiver);

        // When / Then - must not panic
        logger.log(
            &Record::builder()
                .level(Level::Warn)
                .args(format_args!("nobody listening"))
                .build(),
        );
    }
}
