use std::time::Instant;

use crate::{
    bson_util,
    error::{Error, ErrorKind, Result},
    operation::{build_selector, Operation},
    options::ServerAddress,
    trace::{TracingRepresentation, COMMAND_TRACING_EVENT_TARGET},
    wire::Message,
    Client,
};

impl Client {
    /// Execute the given operation against `server`.
    ///
    /// The server's capabilities are looked up fresh for every execution. Errors are returned to
    /// the caller as they occurred; nothing is retried.
    pub(crate) async fn execute_operation<T: Operation>(
        &self,
        op: T,
        server: &ServerAddress,
    ) -> Result<T::O> {
        if self.is_shut_down() {
            return Err(ErrorKind::Shutdown.into());
        }

        let capabilities = self.topology().capabilities(server);
        let is_routing_target = self.topology().is_routing_node(server);

        let intent = op.build(&capabilities)?;
        let selector = build_selector(&intent, &capabilities, is_routing_target);
        let message = Message::Command {
            target_db: intent.db().to_string(),
            selector,
        };
        let command_name = message.name().to_string();

        tracing::debug!(
            target: COMMAND_TRACING_EVENT_TARGET,
            command = message.tracing_representation(),
            databaseName = intent.db(),
            commandName = command_name.as_str(),
            serverHost = server.host(),
            serverPort = server.port_tracing_representation(),
            "Command started"
        );

        let start_time = Instant::now();
        let result = self
            .dispatcher()
            .dispatch(message, server)
            .await
            .and_then(|reply| {
                if bson_util::is_ok(&reply) {
                    Ok(reply)
                } else {
                    Err(Error::from_failed_reply(&reply))
                }
            });
        let duration = start_time.elapsed();

        match result {
            Ok(reply) => {
                tracing::debug!(
                    target: COMMAND_TRACING_EVENT_TARGET,
                    reply = reply.tracing_representation(),
                    commandName = command_name.as_str(),
                    serverHost = server.host(),
                    serverPort = server.port_tracing_representation(),
                    durationMS = duration.as_millis(),
                    "Command succeeded"
                );
                op.handle_response(reply, server)
            }
            Err(error) => {
                tracing::debug!(
                    target: COMMAND_TRACING_EVENT_TARGET,
                    failure = error.tracing_representation(),
                    commandName = command_name.as_str(),
                    serverHost = server.host(),
                    serverPort = server.port_tracing_representation(),
                    durationMS = duration.as_millis(),
                    "Command failed"
                );
                Err(error)
            }
        }
    }
}
