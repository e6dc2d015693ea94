use crate::application::prompt::PromptCanceller;
use crate::domain::services::operation_executor::InterruptSignal;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Exit status for a Ctrl-C at the menu
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// What a Ctrl-C does given where the operator is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// Let the running batch finish its current operation, start no more
    StopBatch,
    /// Cancel the workflow at its prompt and go back to the menu
    CancelWorkflow,
    Exit,
}

pub fn interrupt_action(signal: &InterruptSignal) -> InterruptAction {
    if signal.request() {
        InterruptAction::StopBatch
    } else if signal.is_workflow_active() {
        InterruptAction::CancelWorkflow
    } else {
        InterruptAction::Exit
    }
}

/// Listen for Ctrl-C for the rest of the process.
///
/// A Ctrl-C while a workflow is busy but not prompting is delivered to its
/// next prompt.
pub fn spawn_ctrl_c_listener(
    signal: Arc<InterruptSignal>,
    canceller: PromptCanceller,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                return;
            }

            match interrupt_action(&signal) {
                InterruptAction::StopBatch => {
                    tracing::warn!("Interrupt received, stopping after the current operation");
                    eprintln!("\nInterrupt received: finishing the current operation, the rest will not start.");
                }
                InterruptAction::CancelWorkflow => {
                    tracing::info!("Interrupt received, cancelling the workflow");
                    canceller.cancel();
                }
                InterruptAction::Exit => {
                    tracing::info!("Interrupt received, exiting");
                    eprintln!("\nInterrupted.");
                    std::process::exit(INTERRUPTED_EXIT_CODE);
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ctrl_c_at_menu_exits() {
        let signal = InterruptSignal::new();
        assert_eq!(interrupt_action(&signal), InterruptAction::Exit);
    }

    #[test]
    fn test_ctrl_c_inside_workflow_cancels() {
        let signal = InterruptSignal::new();
        signal.begin_workflow();
        assert_eq!(interrupt_action(&signal), InterruptAction::CancelWorkflow);

        signal.end_workflow();
        assert_eq!(interrupt_action(&signal), InterruptAction::Exit);
    }

    #[test]
    fn test_running_batch_takes_precedence() {
        let signal = InterruptSignal::new();
        signal.begin_workflow();
        signal.begin_batch();
        assert_eq!(interrupt_action(&signal), InterruptAction::StopBatch);
        assert!(signal.is_requested());

        signal.end_batch();
        assert_eq!(interrupt_action(&signal), InterruptAction::CancelWorkflow);
    }
}
