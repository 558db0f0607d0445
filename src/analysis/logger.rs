//! Error callback collaborator.
//!
//! Bulk operations such as [`crate::analysis::AnalysisContext::set_app_class_list`] do not stop
//! at the first failing class. They report each failure through an [`ErrorLogger`] and carry
//! on. Two implementations are provided: [`LogErrorLogger`] forwards to the `log` facade, and
//! [`CollectingErrorLogger`] records events for later inspection.

use std::sync::Mutex;

use crate::{
    metadata::descriptor::{ClassDescriptor, MethodDescriptor},
    Error,
};

/// Receiver of non-fatal analysis errors.
pub trait ErrorLogger: Send + Sync {
    /// A plain error message
    fn log_error(&self, message: &str);

    /// An error message with the failure that caused it
    fn log_error_with_cause(&self, message: &str, cause: &Error);

    /// A class could not be found; the error names it
    fn report_missing_class(&self, error: &Error);

    /// A class could not be found
    fn report_missing_class_descriptor(&self, class: &ClassDescriptor);

    /// Analysis of a method was skipped
    fn report_skipped_analysis(&self, method: &MethodDescriptor);
}

/// [`ErrorLogger`] writing to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrorLogger;

impl ErrorLogger for LogErrorLogger {
    fn log_error(&self, message: &str) {
        log::error!("{message}");
    }

    fn log_error_with_cause(&self, message: &str, cause: &Error) {
        log::error!("{message}: {cause}");
    }

    fn report_missing_class(&self, error: &Error) {
        log::warn!("missing class: {error}");
    }

    fn report_missing_class_descriptor(&self, class: &ClassDescriptor) {
        log::warn!("missing class: {}", class.dotted_name());
    }

    fn report_skipped_analysis(&self, method: &MethodDescriptor) {
        log::debug!("skipped analysis of {method}");
    }
}

/// A single event recorded by [`CollectingErrorLogger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorEvent {
    /// From [`ErrorLogger::log_error`]
    Error(String),
    /// From [`ErrorLogger::log_error_with_cause`]: message and rendered cause
    ErrorWithCause(String, String),
    /// From either missing-class report: slashed class name or rendered error
    MissingClass(String),
    /// From [`ErrorLogger::report_skipped_analysis`]
    SkippedAnalysis(String),
}

/// [`ErrorLogger`] that keeps every event in memory.
#[derive(Debug, Default)]
pub struct CollectingErrorLogger {
    events: Mutex<Vec<ErrorEvent>>,
}

impl CollectingErrorLogger {
    /// Creates an empty logger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all events so far, in reporting order
    #[must_use]
    pub fn events(&self) -> Vec<ErrorEvent> {
        lock!(self.events).clone()
    }

    /// Names of all classes reported missing
    #[must_use]
    pub fn missing_classes(&self) -> Vec<String> {
        lock!(self.events)
            .iter()
            .filter_map(|event| match event {
                ErrorEvent::MissingClass(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ErrorEvent) {
        lock!(self.events).push(event);
    }
}

impl ErrorLogger for CollectingErrorLogger {
    fn log_error(&self, message: &str) {
        self.push(ErrorEvent::Error(message.to_string()));
    }

    fn log_error_with_cause(&self, message: &str, cause: &Error) {
        self.push(ErrorEvent::ErrorWithCause(
            message.to_string(),
            cause.to_string(),
        ));
    }

    fn report_missing_class(&self, error: &Error) {
        let name = match error {
            Error::MissingClass(name) | Error::ClassUnavailable { class: name, .. } => {
                name.clone()
            }
            other => other.to_string(),
        };
        self.push(ErrorEvent::MissingClass(name));
    }

    fn report_missing_class_descriptor(&self, class: &ClassDescriptor) {
        self.push(ErrorEvent::MissingClass(class.name().to_string()));
    }

    fn report_skipped_analysis(&self, method: &MethodDescriptor) {
        self.push(ErrorEvent::SkippedAnalysis(method.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::registry::DescriptorRegistry;

    #[test]
    fn collects_in_order() {
        let registry = DescriptorRegistry::new();
        let class = registry.class_descriptor("a/Missing").unwrap();
        let method = registry.method_descriptor("a/B", "m", "()V", false).unwrap();

        let logger = CollectingErrorLogger::new();
        logger.log_error("first");
        logger.log_error_with_cause("second", &Error::MissingClass("x/Y".to_string()));
        logger.report_missing_class(&Error::ClassUnavailable {
            class: "x/Y".to_string(),
            source: Box::new(Error::MissingClass("x/Y".to_string())),
        });
        logger.report_missing_class_descriptor(&class);
        logger.report_skipped_analysis(&method);

        assert_eq!(
            logger.events(),
            vec![
                ErrorEvent::Error("first".to_string()),
                ErrorEvent::ErrorWithCause(
                    "second".to_string(),
                    "Missing class - x/Y".to_string()
                ),
                ErrorEvent::MissingClass("x/Y".to_string()),
                ErrorEvent::MissingClass("a/Missing".to_string()),
                ErrorEvent::SkippedAnalysis("a/B.m()V".to_string()),
            ]
        );
        assert_eq!(logger.missing_classes(), vec!["x/Y", "a/Missing"]);
    }

    #[test]
    fn log_logger_accepts_all_shapes() {
        let registry = DescriptorRegistry::new();
        let logger = LogErrorLogger;
        logger.log_error("message");
        logger.log_error_with_cause("message", &Error::Unsupported("x"));
        logger.report_missing_class(&Error::MissingClass("a/B".to_string()));
        logger.report_missing_class_descriptor(&registry.class_descriptor("a/B").unwrap());
        logger.report_skipped_analysis(
            &registry.method_descriptor("a/B", "m", "()V", false).unwrap(),
        );
    }
}
