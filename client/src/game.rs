//! Client view of the arena: the latest payload, the locally rebuilt map,
//! and the events derived from each new payload.

use crate::events::{EventBus, GameEvent};
use crate::network::{ClientError, UdpClient};
use log::{debug, warn};
use shared::codec::{decode_payload, is_handshake_response};
use shared::{
    Command, Field, GameState, LatestQueue, Map, Payload, PerkKind, Position, SnakeView,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Events implied by going from `old` to `new`. Each kind fires at most once
/// per payload; several kinds may fire together.
pub fn derive_events(old: &Payload, new: &Payload) -> Vec<GameEvent> {
    let pairs: Vec<(&SnakeView, &SnakeView)> = old.snakes().zip(new.snakes()).collect();
    let increased = |measure: fn(&SnakeView) -> u16| {
        pairs
            .iter()
            .any(|(before, after)| measure(after) > measure(before))
    };

    let was_running = old.state == GameState::Ongoing;
    let is_running = new.state == GameState::Ongoing;
    let mut events = Vec::new();

    if is_running && !was_running {
        events.push(GameEvent::GameStarted);
    }
    if was_running && !is_running {
        events.push(GameEvent::GameEnded);
    }
    if was_running && pairs.iter().any(|(before, after)| after.lives < before.lives) {
        events.push(GameEvent::PlayerCrashed);
    }
    // Scores and perks only mean something between two running payloads.
    if !(was_running && is_running) {
        return events;
    }
    if increased(|snake| snake.score) {
        events.push(GameEvent::PlayerAte);
    }
    if increased(|snake| snake.used(PerkKind::Dash)) {
        events.push(GameEvent::PlayerDashed);
    }
    if increased(|snake| snake.used(PerkKind::WallWalk)) {
        events.push(GameEvent::PlayerWalkedWall);
    }
    events
}

pub struct GameClient {
    transport: Option<UdpClient>,
    inbound: LatestQueue<Vec<u8>>,
    outbound: LatestQueue<Command>,
    width: u16,
    height: u16,
    map: Map,
    payload: Payload,
    bus: EventBus,
    events_tx: mpsc::UnboundedSender<GameEvent>,
    dispatcher: JoinHandle<()>,
}

impl GameClient {
    /// Connects to `server` for a board of `width` x `height` cells.
    pub async fn connect(server: &str, width: u16, height: u16) -> Result<Self, ClientError> {
        let transport = UdpClient::connect(server).await?;
        let (inbound, outbound) = transport.queues();

        let mut client = Self::with_queues(inbound, outbound, width, height);
        client.transport = Some(transport);
        Ok(client)
    }

    /// A client fed from the given queues instead of a socket. Must be
    /// called inside a tokio runtime.
    pub fn with_queues(
        inbound: LatestQueue<Vec<u8>>,
        outbound: LatestQueue<Command>,
        width: u16,
        height: u16,
    ) -> Self {
        let payload = Payload::default();
        let bus = EventBus::new();
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();

        let dispatch_bus = bus.clone();
        let dispatcher = tokio::spawn(async move {
            while let Some(event) = events_rx.recv().await {
                let reached = dispatch_bus.dispatch(event);
                debug!("Dispatched {} to {} listener(s)", event, reached);
            }
        });

        Self {
            transport: None,
            inbound,
            outbound,
            width,
            height,
            map: Map::new(payload.map_level, width, height),
            payload,
            bus,
            events_tx,
            dispatcher,
        }
    }

    pub fn press_key(&self, key: char) -> bool {
        match Command::from_key(key) {
            Some(command) => {
                self.outbound.push(command);
                true
            }
            None => false,
        }
    }

    /// Applies every queued message in arrival order and returns the events
    /// they produced. Listeners are called from a separate task.
    pub fn update_payload(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();

        while let Some(message) = self.inbound.try_pop() {
            if is_handshake_response(&message) {
                continue;
            }
            let payload = match decode_payload(&message) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("Ignoring undecodable payload: {}", e);
                    continue;
                }
            };

            if payload.map_level != self.payload.map_level {
                debug!("Rebuilding map for level {}", payload.map_level);
                self.map = Map::new(payload.map_level, self.width, self.height);
            }

            let derived = derive_events(&self.payload, &payload);
            for event in &derived {
                if self.events_tx.send(*event).is_err() {
                    warn!("Event dispatcher is gone, dropping {}", event);
                }
            }
            events.extend(derived);
            self.payload = payload;
        }
        events
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn state(&self) -> GameState {
        self.payload.state
    }

    pub fn add_listener<F>(&self, event: GameEvent, listener: F)
    where
        F: Fn(GameEvent) + Send + Sync + 'static,
    {
        self.bus.add(event, listener);
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    /// What the latest payload shows at `pos`.
    pub fn field(&self, pos: Position) -> Field {
        if self.map.is_wall(pos) {
            return Field::Wall;
        }
        if let Some(candy) = self.payload.candies.iter().find(|c| c.position == pos) {
            return Field::Candy(candy.kind);
        }
        if self.payload.player.body.contains(&pos) {
            return Field::OwnSnake;
        }
        if self
            .payload
            .opponents
            .iter()
            .any(|snake| snake.body.contains(&pos))
        {
            return Field::Opponent;
        }
        Field::Empty
    }

    /// Walls only, for when no usable payload has arrived.
    pub fn world(&self, pos: Position) -> Field {
        if self.map.is_wall(pos) {
            Field::Wall
        } else {
            Field::Empty
        }
    }

    pub fn disconnect(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.disconnect();
        }
    }
}

impl Drop for GameClient {
    fn drop(&mut self) {
        self.dispatcher.abort();
    }
}
