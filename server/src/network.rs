//! Server network layer: UDP tasks and the session loop

use crate::client_manager::{ClientManager, Registration};
use crate::game::Game;
use log::{debug, error, info, warn};
use shared::codec::{encode_payload, frame, handshake_frame, CodecError};
use shared::{
    Command, GameState, LatestQueue, CLIENT_TIMEOUT, DEFAULT_BOARD_HEIGHT, DEFAULT_BOARD_WIDTH,
    HANDSHAKE_REQUEST, MAX_FRAME_SIZE, RESENDS_PER_TICK, TICK_INTERVAL,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::interval;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: String,
    pub players: usize,
    pub tick: Duration,
    pub width: u16,
    pub height: u16,
    pub client_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8080".to_string(),
            players: 2,
            tick: TICK_INTERVAL,
            width: DEFAULT_BOARD_WIDTH,
            height: DEFAULT_BOARD_HEIGHT,
            client_timeout: CLIENT_TIMEOUT,
        }
    }
}

/// Messages sent from network tasks to the session loop
#[derive(Debug)]
pub enum ServerMessage {
    /// These peers went silent; the registry has already been cleared.
    ConnectionLost { clients: Vec<usize> },
}

/// Applies one player command according to the game state. Confirm starts
/// a paused game or leaves a finished one; steering and dashing only count
/// while the game is running.
pub fn apply_command(game: &mut Game, player: usize, command: Command) {
    match (game.state(), command) {
        (GameState::Paused, Command::Confirm) => game.toggle_paused(),
        (GameState::RoundFinished | GameState::GameFinished, Command::Confirm) => game.reset(),
        (GameState::Ongoing, Command::Turn(direction)) => {
            game.change_direction(player, direction);
        }
        (GameState::Ongoing, Command::Dash) => {
            game.dash(player);
        }
        _ => {}
    }
}

/// Main server coordinating networking and game simulation
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<Mutex<ClientManager>>,
    game: Game,
    config: ServerConfig,
    lobby_full: Arc<Notify>,
    tasks: Vec<JoinHandle<()>>,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    pub async fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let socket = Arc::new(UdpSocket::bind(&config.addr).await?);
        info!(
            "Server listening on {} for {} players",
            socket.local_addr()?,
            config.players
        );

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            clients: Arc::new(Mutex::new(ClientManager::with_timeout(
                config.players,
                config.client_timeout,
            ))),
            game: Game::new(config.players, config.width, config.height),
            config,
            lobby_full: Arc::new(Notify::new()),
            tasks: Vec::new(),
            server_tx,
            server_rx,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.socket.local_addr()?)
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Spawns the reader and timeout tasks once.
    fn start(&mut self) -> Result<(), ServerError> {
        if !self.tasks.is_empty() {
            return Ok(());
        }
        let pong = handshake_frame()?;
        self.tasks.push(self.spawn_network_receiver(pong));
        self.tasks.push(self.spawn_timeout_checker());
        Ok(())
    }

    /// Spawns task that reads every datagram and routes it by its first key
    fn spawn_network_receiver(&self, pong: Vec<u8>) -> JoinHandle<()> {
        let socket = Arc::clone(&self.socket);
        let clients = Arc::clone(&self.clients);
        let lobby_full = Arc::clone(&self.lobby_full);

        tokio::spawn(async move {
            let mut buffer = vec![0u8; MAX_FRAME_SIZE];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        let mut manager = clients.lock().await;
                        handle_datagram(&mut manager, &socket, &pong, &buffer[..len], addr);
                        if manager.is_lobby_open() && manager.is_ready() {
                            lobby_full.notify_one();
                        }
                    }
                    Err(e) => {
                        error!("Error receiving datagram: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        })
    }

    /// Spawns task that ends the session once any peer goes silent
    fn spawn_timeout_checker(&self) -> JoinHandle<()> {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();
        let period = self.config.client_timeout.min(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);

            loop {
                interval.tick().await;

                let lost = {
                    let mut manager = clients.lock().await;
                    let lost = manager.check_timeouts();
                    if !lost.is_empty() {
                        manager.clear();
                    }
                    lost
                };
                if lost.is_empty() {
                    continue;
                }

                warn!("Lost connection to clients {:?}", lost);
                if let Err(e) = server_tx.send(ServerMessage::ConnectionLost { clients: lost }) {
                    error!("Failed to send timeout message: {}", e);
                    break;
                }
            }
        })
    }

    /// Opens the lobby and waits until every slot is taken.
    async fn wait_for_players(&mut self) {
        loop {
            {
                let mut manager = self.clients.lock().await;
                manager.open_lobby();
                if manager.is_ready() {
                    return;
                }
                info!(
                    "Waiting for players ({}/{})",
                    manager.len(),
                    manager.max_clients()
                );
            }

            tokio::select! {
                _ = self.lobby_full.notified() => {},
                message = self.server_rx.recv() => {
                    if let Some(ServerMessage::ConnectionLost { clients }) = message {
                        info!("Lobby lost clients {:?}, listening again", clients);
                    }
                }
            }
        }
    }

    /// Simulates one tick and frames each player's view of the result.
    fn step(
        &mut self,
        commands: &[LatestQueue<Command>],
    ) -> Result<Vec<Vec<u8>>, ServerError> {
        for (player, queue) in commands.iter().enumerate() {
            if let Some(command) = queue.try_pop() {
                debug!("Player {} sent {:?}", player, command);
                apply_command(&mut self.game, player, command);
            }
        }
        self.game.tick();

        let mut datagrams = Vec::with_capacity(commands.len());
        for player in 0..self.game.player_count() {
            if let Some(payload) = self.game.payload_for(player) {
                datagrams.push(frame(&encode_payload(&payload)?)?);
            }
        }
        Ok(datagrams)
    }

    /// Plays one session: fill the lobby, then tick and broadcast until a
    /// peer is lost.
    pub async fn run_session(&mut self) -> Result<(), ServerError> {
        self.start()?;
        self.wait_for_players().await;

        self.game.restart();
        let (commands, updates) = {
            let mut manager = self.clients.lock().await;
            manager.start_broadcasting();
            info!("Session peers: {:?}", manager.client_addrs());
            let ids = 0..manager.len();
            let commands: Vec<_> = ids.clone().filter_map(|id| manager.commands(id)).collect();
            let updates: Vec<_> = ids.filter_map(|id| manager.updates(id)).collect();
            (commands, updates)
        };
        info!("Session started with {} players", updates.len());

        let mut ticker = interval(self.config.tick / RESENDS_PER_TICK);
        let mut cycle: u32 = 0;
        let mut latest: Vec<Vec<u8>> = Vec::new();

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::ConnectionLost { clients }) => {
                            info!("Session over, lost clients {:?}", clients);
                        }
                        None => info!("Server shutting down"),
                    }
                    return Ok(());
                },

                _ = ticker.tick() => {
                    if cycle % RESENDS_PER_TICK == 0 {
                        latest = self.step(&commands)?;
                    }
                    for (datagram, queue) in latest.iter().zip(&updates) {
                        queue.push(datagram.clone());
                    }
                    cycle = cycle.wrapping_add(1);
                },
            }
        }
    }

    /// Main server loop: sessions back to back, forever
    pub async fn run(&mut self) -> Result<(), ServerError> {
        self.start()?;
        info!("Server started successfully");

        loop {
            self.run_session().await?;
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
        if let Ok(mut manager) = self.clients.try_lock() {
            manager.clear();
        }
    }
}

/// Routes one datagram from `addr`. Handshakes register or refresh the
/// peer, anything else is queued as a command.
fn handle_datagram(
    manager: &mut ClientManager,
    socket: &Arc<UdpSocket>,
    pong: &[u8],
    data: &[u8],
    addr: SocketAddr,
) {
    if data.first() != Some(&HANDSHAKE_REQUEST) {
        match Command::from_datagram(data) {
            Some(command) => {
                if !manager.push_command(addr, command) {
                    debug!("Command from unknown peer {}", addr);
                }
            }
            None => warn!("Ignoring unreadable datagram from {}", addr),
        }
        return;
    }

    match manager.register(addr) {
        Registration::New(id) => {
            if let Some(updates) = manager.updates(id) {
                spawn_writer(Arc::clone(socket), addr, updates.clone());
                updates.push(pong.to_vec());
            }
        }
        Registration::Known(id) => {
            if !manager.is_broadcasting() {
                if let Some(updates) = manager.updates(id) {
                    updates.push(pong.to_vec());
                }
            }
        }
        Registration::Full => info!("Rejecting {}: lobby is full", addr),
        Registration::Closed => debug!("Ignoring handshake from {}: lobby closed", addr),
    }
}

/// Sends whatever lands in `updates` to `addr` until the queue is closed
fn spawn_writer(socket: Arc<UdpSocket>, addr: SocketAddr, updates: LatestQueue<Vec<u8>>) {
    tokio::spawn(async move {
        while let Some(datagram) = updates.pop().await {
            if let Err(e) = socket.send_to(&datagram, addr).await {
                error!("Failed to send to {}: {}", addr, e);
            }
        }
        debug!("Writer for {} finished", addr);
    });
}
