use bytes::BytesMut;
use log::{debug, info, warn};
use std::{
    net::{Ipv4Addr, SocketAddrV4},
    path::PathBuf,
    sync::Arc,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::mpsc::{self, UnboundedSender},
};

use clock::{SharedClock, SystemClock};
use config::Config;
use kv::{FileKv, KeyValueStore, MemoryKv};
use request::Request;
use response::Response;
use state::{send_command, Command, Event, State};
use store::StoryStore;

mod clock;
mod config;
mod error;
mod gesture;
mod kv;
mod payload;
mod request;
mod resp_value;
mod response;
mod state;
mod store;
mod story;
mod time_ago;
mod timer;
mod viewer;

const ADDRESS: Ipv4Addr = Ipv4Addr::LOCALHOST;

async fn handle_connection(
    mut stream: TcpStream,
    events: UnboundedSender<Event>,
) -> anyhow::Result<()> {
    let mut input_buf = [0; 4096];
    let mut output_buf = BytesMut::with_capacity(512);
    loop {
        let bytes_read = stream.read(&mut input_buf).await?;
        if bytes_read == 0 {
            return Ok(());
        }

        // TODO: Buffer requests that span more than one read
        output_buf.clear();
        let mut data = &input_buf[0..bytes_read];
        while !data.is_empty() {
            match Request::deserialize(data) {
                Ok((request, rest)) => {
                    data = rest;
                    dispatch(request, &events)
                        .await?
                        .serialize(&mut output_buf);
                }
                Err(e) => {
                    warn!("failed to deserialize request: {}", e);
                    Response::Error(e.to_string()).serialize(&mut output_buf);
                    break;
                }
            }
        }
        stream.write_all(&output_buf).await?;
    }
}

/// Image files are resized and encoded here, off the state task, so a failed
/// or slow decode never touches the store.
async fn dispatch(request: Request<'_>, events: &UnboundedSender<Event>) -> anyhow::Result<Response> {
    let command = match request {
        Request::Add { path } => match payload::produce(PathBuf::from(path)).await {
            Ok(image) => Command::Add(image),
            Err(e) => {
                warn!("error uploading image {}: {}", path, e);
                return Ok(Response::Error(e.to_string()));
            }
        },
        Request::Command(command) => command,
    };
    send_command(events, command).await
}

fn open_kv(config: &Config) -> anyhow::Result<Box<dyn KeyValueStore>> {
    match config.db_path() {
        Some(path) => {
            let kv = FileKv::open(path)?;
            info!("persisting stories to {}", kv.path().display());
            Ok(Box::new(kv))
        }
        None => {
            warn!("no --dir and --dbfilename given, stories will not survive a restart");
            Ok(Box::new(MemoryKv::default()))
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_args(std::env::args())?;
    let clock: SharedClock = Arc::new(SystemClock);
    let store = StoryStore::open(open_kv(&config)?, clock.clone());
    info!("loaded {} live stories", store.len());

    let (events, receiver) = mpsc::unbounded_channel();
    let state = State::new(store, clock, events.clone());
    let state_task = tokio::spawn(state::run(state, receiver));

    let listener = TcpListener::bind(SocketAddrV4::new(ADDRESS, config.port()?)).await?;
    info!("listening on {}", listener.local_addr()?);
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = accepted?;
                debug!("connection from {}", peer);
                let events = events.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, events).await {
                        warn!("connection {} closed: {}", peer, e);
                    }
                });
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }

    // Stopping the state task drops every timer it owns
    let _ = events.send(Event::Shutdown);
    state_task.await?;
    Ok(())
}
