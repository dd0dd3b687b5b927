use std::sync::Arc;

use relay_core::config::AppConfig;
use relay_runner::{CommandRunner, ProcessRunner};
use relay_slack::{
    actions::ActionDispatcher,
    api::{ChatApi, NoopChatApi},
    events::{AppMentionHandler, EventDispatcher, InteractiveHandler, SlashCommandHandler},
    mention::MentionRouter,
    socket::SocketModeRunner,
};

pub struct Application {
    pub config: Arc<AppConfig>,
    pub slack_runner: SocketModeRunner,
}

/// Assemble the dispatcher with production services behind the chat-api and
/// runner seams. The concrete WebSocket transport lives outside this tree;
/// until one is wired in, the runner drains a no-op transport.
pub fn bootstrap_with_config(config: AppConfig) -> Application {
    let config = Arc::new(config);
    let api: Arc<dyn ChatApi> = Arc::new(NoopChatApi);
    let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner);

    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(SlashCommandHandler::new(Arc::clone(&api), Arc::clone(&config)));
    dispatcher.register(AppMentionHandler::new(MentionRouter::new(
        Arc::clone(&api),
        Arc::clone(&config),
        Arc::clone(&runner),
    )));
    dispatcher.register(InteractiveHandler::new(ActionDispatcher::new(
        Arc::clone(&api),
        Arc::clone(&config),
        Arc::clone(&runner),
    )));

    let slack_runner = SocketModeRunner::default().with_dispatcher(dispatcher);

    Application { config, slack_runner }
}
