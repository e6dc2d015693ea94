//! Interactive menu loop

use crate::application::handlers::{init_handler, savings_handler, transfer_handler, AppContext};
use crate::application::prompt::Prompter;
use crate::domain::errors::{ConfigError, InputError, WorkflowError};
use crate::domain::repositories::config_repository::ConfigRepository;
use crate::infrastructure::version_checker::{format_notice, UpdateNotice};
use crate::persistence::json_store::JsonConfigRepository;
use std::sync::Arc;

const MENU: &str = "\n==== flexman ====\n1. Initialize sub-accounts and API keys\n2. Manage savings\n3. Manage transfers\n0. Exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Initialize,
    Savings,
    Transfers,
    Exit,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(MenuChoice::Initialize),
            "2" => Some(MenuChoice::Savings),
            "3" => Some(MenuChoice::Transfers),
            "0" => Some(MenuChoice::Exit),
            _ => None,
        }
    }
}

pub struct App {
    context: AppContext,
    repository: Option<Arc<dyn ConfigRepository>>,
    update_notice: UpdateNotice,
}

impl App {
    pub fn new(
        context: AppContext,
        repository: Option<Arc<dyn ConfigRepository>>,
        update_notice: UpdateNotice,
    ) -> Self {
        Self {
            context,
            repository,
            update_notice,
        }
    }

    /// Run until the operator exits or input ends
    pub async fn run(&mut self, prompter: &mut dyn Prompter) {
        loop {
            if let Some(info) = self.update_notice.poll() {
                prompter.say(&format_notice(&info));
            }

            prompter.say(MENU);
            let answer = match prompter.ask("Choose: ") {
                Ok(answer) => answer,
                // Ctrl-C that reached a workflow after its last prompt
                Err(InputError::Cancelled) => continue,
                Err(_) => break,
            };

            let choice = match MenuChoice::parse(&answer) {
                Some(MenuChoice::Exit) => break,
                Some(choice) => choice,
                None => {
                    prompter.say("Unknown option, choose 0-3.");
                    continue;
                }
            };

            self.context.interrupt.begin_workflow();
            let result = self.dispatch(choice, prompter).await;
            self.context.interrupt.end_workflow();

            if let Err(e) = result {
                if matches!(e, WorkflowError::Input(InputError::EndOfInput)) {
                    break;
                }
                report_error(prompter, &e);
            }
        }
        tracing::info!("Exiting");
    }

    async fn dispatch(
        &mut self,
        choice: MenuChoice,
        prompter: &mut dyn Prompter,
    ) -> Result<(), WorkflowError> {
        let repository = self.accounts_repository(prompter)?;
        match choice {
            MenuChoice::Initialize => {
                init_handler::run(&self.context, repository, prompter).await?;
            }
            MenuChoice::Savings => {
                savings_handler::run(&self.context, repository, prompter).await?;
            }
            MenuChoice::Transfers => {
                transfer_handler::run(&self.context, repository, prompter).await?;
            }
            MenuChoice::Exit => {}
        }
        Ok(())
    }

    /// The accounts file picked at startup, or one asked for now.
    ///
    /// A prompted path is kept only once it loads, so a mistyped path is
    /// asked for again next time.
    fn accounts_repository(
        &mut self,
        prompter: &mut dyn Prompter,
    ) -> Result<Arc<dyn ConfigRepository>, WorkflowError> {
        if let Some(repository) = &self.repository {
            return Ok(repository.clone());
        }

        let path = prompter.ask("Path to the accounts file: ")?;
        let path = path.trim().trim_matches('"');
        if path.is_empty() {
            return Err(ConfigError::NotSelected.into());
        }

        let repository: Arc<dyn ConfigRepository> = Arc::new(JsonConfigRepository::new(path));
        repository.load()?;
        tracing::info!(path = %repository.location(), "Using accounts file");
        self.repository = Some(repository.clone());
        Ok(repository)
    }
}

fn report_error(prompter: &mut dyn Prompter, error: &WorkflowError) {
    if error.is_cancellation() {
        prompter.say(&format!("Cancelled: {}", error));
    } else {
        tracing::error!("Workflow failed: {}", error);
        prompter.say(&format!("Error: {}", error));
    }
}
