use std::sync::Arc;

use futures_util::StreamExt;
use tootstream::{
    ws::{ChannelDelegate, ClientEvent, ListenerEvent, StreamSubscription},
    Instance,
};

fn env_or_exit(name: &str) -> String {
    std::env::var(name)
        .map_err(|_| {
            println!("No {} env var or invalid", name);
            std::process::exit(1);
        })
        .unwrap()
}

fn subscription(name: &str) -> StreamSubscription {
    match name.split_once(':') {
        Some(("hashtag", tag)) => StreamSubscription::Hashtag(tag.to_string()),
        Some(("list", id)) => StreamSubscription::List(id.to_string()),
        _ => match name {
            "public" => StreamSubscription::Public,
            "public:local" => StreamSubscription::PublicLocal,
            "direct" => StreamSubscription::Direct,
            _ => StreamSubscription::User,
        },
    }
}

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    let base_url = env_or_exit("MASTODON_BASE_URL");
    let token = env_or_exit("MASTODON_ACCESS_TOKEN");
    let stream = std::env::var("MASTODON_STREAM").unwrap_or_else(|_| "user".to_string());

    let instance = Instance::new(&base_url, token).unwrap();
    let listener = instance.listener().unwrap();

    let (delegate, mut events) = ChannelDelegate::new();
    let delegate = Arc::new(delegate);
    listener.set_delegate(&delegate);
    listener.subscribe(subscription(&stream));

    while let Some(event) = events.next().await {
        match event {
            ListenerEvent::Connected => println!("connected"),
            ListenerEvent::Disconnected { code } => println!("disconnected, code {}", code),
            ListenerEvent::Event(ClientEvent::Update(status)) => {
                println!("[{}] @{}: {}", status.id, status.account.acct, status.content)
            }
            ListenerEvent::Event(ClientEvent::Notification(n)) => {
                println!("{} from @{}", n.r#type.as_str(), n.account.acct)
            }
            ListenerEvent::Event(event) => println!("{:?}", event),
            ListenerEvent::DecodeError(err) => println!("bad frame: {}", err),
        }
    }
}
