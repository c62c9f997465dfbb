use crate::{
    bson::Document,
    error::{Error, Result},
    operation::{CommandIntent, Operation},
    options::{RunCommandOptions, ServerAddress},
    sdam::ServerCapabilities,
};

#[derive(Debug, Clone)]
pub(crate) struct RunCommand {
    db: String,
    command: Document,
    options: Option<RunCommandOptions>,
}

impl RunCommand {
    pub(crate) fn new(
        db: String,
        command: Document,
        options: Option<RunCommandOptions>,
    ) -> Result<Self> {
        if command.is_empty() {
            return Err(Error::invalid_argument(
                "an empty document cannot be passed to a run_command operation",
            ));
        }

        Ok(Self {
            db,
            command,
            options,
        })
    }
}

impl Operation for RunCommand {
    type O = Document;

    // Since we can't actually specify a string statically here, we just put a descriptive string
    // that should fail loudly if accidentally passed to the server.
    const NAME: &'static str = "$genericRunCommand";

    fn build(&self, _capabilities: &ServerCapabilities) -> Result<CommandIntent> {
        let write_concern = self
            .options
            .as_ref()
            .and_then(|opts| opts.write_concern.clone());
        if let Some(ref write_concern) = write_concern {
            write_concern.validate()?;
        }

        Ok(CommandIntent::new(self.db.as_str(), self.command.clone())?
            .with_write_concern(write_concern)
            .with_read_preference(
                self.options
                    .as_ref()
                    .and_then(|opts| opts.read_preference.clone()),
            ))
    }

    fn handle_response(&self, response: Document, _address: &ServerAddress) -> Result<Self::O> {
        Ok(response)
    }
}
