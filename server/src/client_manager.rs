//! Registry of the peers taking part in a session.
//!
//! Each peer owns two queues: commands flowing in from the reader task and
//! framed datagrams flowing out through its writer task. Peers are never
//! removed one at a time. Losing any of them ends the session, so the
//! registry is cleared as a whole and the lobby reopens.

use log::info;
use shared::{Command, LatestQueue, CLIENT_TIMEOUT, SERVER_COMMAND_QUEUE, SERVER_STATE_QUEUE};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Slot index of a peer, which doubles as its player index in the game.
pub type PeerId = usize;

#[derive(Debug)]
pub struct Client {
    pub id: PeerId,
    pub addr: SocketAddr,
    /// Last time any datagram arrived from this peer
    pub last_seen: Instant,
    pub commands: LatestQueue<Command>,
    /// Framed datagrams waiting for the writer task
    pub updates: LatestQueue<Vec<u8>>,
}

impl Client {
    pub fn new(id: PeerId, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            last_seen: Instant::now(),
            commands: LatestQueue::new(SERVER_COMMAND_QUEUE),
            updates: LatestQueue::new(SERVER_STATE_QUEUE),
        }
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Outcome of a handshake request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    New(PeerId),
    Known(PeerId),
    Full,
    /// The lobby is not accepting anyone right now.
    Closed,
}

pub struct ClientManager {
    clients: Vec<Client>,
    max_clients: usize,
    timeout: Duration,
    lobby_open: bool,
    broadcasting: bool,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self::with_timeout(max_clients, CLIENT_TIMEOUT)
    }

    pub fn with_timeout(max_clients: usize, timeout: Duration) -> Self {
        Self {
            clients: Vec::with_capacity(max_clients),
            max_clients,
            timeout,
            lobby_open: false,
            broadcasting: false,
        }
    }

    /// Handles a handshake from `addr`. Known peers are refreshed, unknown
    /// ones get the next free slot while the lobby is open.
    pub fn register(&mut self, addr: SocketAddr) -> Registration {
        if let Some(id) = self.touch(addr) {
            return Registration::Known(id);
        }
        if !self.lobby_open {
            return Registration::Closed;
        }
        if self.is_ready() {
            return Registration::Full;
        }

        let id = self.clients.len();
        self.clients.push(Client::new(id, addr));
        info!(
            "Client {} connected from {} ({}/{})",
            id,
            addr,
            self.clients.len(),
            self.max_clients
        );
        Registration::New(id)
    }

    pub fn find_client_by_addr(&self, addr: SocketAddr) -> Option<PeerId> {
        self.clients
            .iter()
            .find(|client| client.addr == addr)
            .map(|client| client.id)
    }

    /// Marks `addr` as alive. Returns its id if it is registered.
    pub fn touch(&mut self, addr: SocketAddr) -> Option<PeerId> {
        let client = self.clients.iter_mut().find(|client| client.addr == addr)?;
        client.touch();
        Some(client.id)
    }

    /// Queues a command from `addr`, dropping the oldest one when the
    /// queue is full. Returns false for unknown peers.
    pub fn push_command(&mut self, addr: SocketAddr, command: Command) -> bool {
        match self.clients.iter_mut().find(|client| client.addr == addr) {
            Some(client) => {
                client.touch();
                client.commands.push(command);
                true
            }
            None => false,
        }
    }

    pub fn commands(&self, id: PeerId) -> Option<LatestQueue<Command>> {
        self.clients.get(id).map(|client| client.commands.clone())
    }

    pub fn updates(&self, id: PeerId) -> Option<LatestQueue<Vec<u8>>> {
        self.clients.get(id).map(|client| client.updates.clone())
    }

    /// Ids of peers that have been silent for longer than the timeout.
    pub fn check_timeouts(&self) -> Vec<PeerId> {
        self.clients
            .iter()
            .filter(|client| client.is_timed_out(self.timeout))
            .map(|client| client.id)
            .collect()
    }

    /// Forgets every peer and closes their queues, which ends their writer
    /// tasks. The lobby stays closed until reopened.
    pub fn clear(&mut self) {
        for client in self.clients.drain(..) {
            client.commands.close();
            client.updates.close();
            info!("Client {} at {} disconnected", client.id, client.addr);
        }
        self.lobby_open = false;
        self.broadcasting = false;
    }

    pub fn open_lobby(&mut self) {
        self.lobby_open = true;
    }

    pub fn is_lobby_open(&self) -> bool {
        self.lobby_open
    }

    /// Closes the lobby. From now on handshakes from known peers only keep
    /// them alive and are not answered.
    pub fn start_broadcasting(&mut self) {
        self.lobby_open = false;
        self.broadcasting = true;
    }

    pub fn is_broadcasting(&self) -> bool {
        self.broadcasting
    }

    /// True once every player slot is taken.
    pub fn is_ready(&self) -> bool {
        self.clients.len() >= self.max_clients
    }

    pub fn max_clients(&self) -> usize {
        self.max_clients
    }

    pub fn client_addrs(&self) -> Vec<(PeerId, SocketAddr)> {
        self.clients
            .iter()
            .map(|client| (client.id, client.addr))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Direction;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:8081".parse().unwrap()
    }

    fn open_manager(max_clients: usize) -> ClientManager {
        let mut manager = ClientManager::new(max_clients);
        manager.open_lobby();
        manager
    }

    #[test]
    fn test_client_creation() {
        let client = Client::new(0, test_addr());

        assert_eq!(client.id, 0);
        assert_eq!(client.addr, test_addr());
        assert_eq!(client.commands.capacity(), SERVER_COMMAND_QUEUE);
        assert_eq!(client.updates.capacity(), SERVER_STATE_QUEUE);
    }

    #[test]
    fn test_client_timeout() {
        let mut client = Client::new(0, test_addr());
        assert!(!client.is_timed_out(Duration::from_secs(1)));

        client.last_seen = Instant::now() - Duration::from_secs(2);
        assert!(client.is_timed_out(Duration::from_secs(1)));

        client.touch();
        assert!(!client.is_timed_out(Duration::from_secs(1)));
    }

    #[test]
    fn test_closed_lobby_rejects_strangers() {
        let mut manager = ClientManager::new(2);

        assert_eq!(manager.register(test_addr()), Registration::Closed);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_register_assigns_slots_in_order() {
        let mut manager = open_manager(2);

        assert_eq!(manager.register(test_addr()), Registration::New(0));
        assert_eq!(manager.register(test_addr2()), Registration::New(1));
        assert_eq!(manager.len(), 2);
        assert!(manager.is_ready());
    }

    #[test]
    fn test_register_twice_is_known() {
        let mut manager = open_manager(2);

        manager.register(test_addr());
        assert_eq!(manager.register(test_addr()), Registration::Known(0));
        assert_eq!(manager.len(), 1);
        assert!(!manager.is_ready());
    }

    #[test]
    fn test_full_lobby() {
        let mut manager = open_manager(1);

        manager.register(test_addr());
        assert_eq!(manager.register(test_addr2()), Registration::Full);
        assert_eq!(manager.find_client_by_addr(test_addr2()), None);
    }

    #[test]
    fn test_known_peer_stays_known_while_broadcasting() {
        let mut manager = open_manager(1);
        manager.register(test_addr());
        manager.start_broadcasting();

        assert!(manager.is_broadcasting());
        assert!(!manager.is_lobby_open());
        assert_eq!(manager.register(test_addr()), Registration::Known(0));
        assert_eq!(manager.register(test_addr2()), Registration::Closed);
    }

    #[test]
    fn test_push_command_keeps_latest_three() {
        let mut manager = open_manager(1);
        manager.register(test_addr());

        let keys = [
            Command::Turn(Direction::North),
            Command::Turn(Direction::West),
            Command::Dash,
            Command::Confirm,
        ];
        for command in keys {
            assert!(manager.push_command(test_addr(), command));
        }

        let queue = manager.commands(0).unwrap();
        assert_eq!(queue.try_pop(), Some(Command::Turn(Direction::West)));
        assert_eq!(queue.try_pop(), Some(Command::Dash));
        assert_eq!(queue.try_pop(), Some(Command::Confirm));
        assert_eq!(queue.try_pop(), None);
    }

    #[test]
    fn test_push_command_from_stranger() {
        let mut manager = open_manager(1);

        assert!(!manager.push_command(test_addr(), Command::Dash));
    }

    #[test]
    fn test_check_timeouts() {
        let mut manager = ClientManager::with_timeout(2, Duration::from_millis(50));
        manager.open_lobby();
        manager.register(test_addr());
        manager.register(test_addr2());

        manager.clients[0].last_seen = Instant::now() - Duration::from_millis(100);

        assert_eq!(manager.check_timeouts(), vec![0]);
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_clear_closes_queues() {
        let mut manager = open_manager(2);
        manager.register(test_addr());
        manager.start_broadcasting();
        let updates = manager.updates(0).unwrap();
        let commands = manager.commands(0).unwrap();

        manager.clear();

        assert!(manager.is_empty());
        assert!(updates.is_closed());
        assert!(commands.is_closed());
        assert!(!manager.is_broadcasting());
        assert!(!manager.is_lobby_open());
    }

    #[test]
    fn test_client_addrs() {
        let mut manager = open_manager(3);
        manager.register(test_addr());
        manager.register(test_addr2());

        let addrs = manager.client_addrs();
        assert_eq!(addrs, vec![(0, test_addr()), (1, test_addr2())]);
        assert_eq!(manager.max_clients(), 3);
    }
}
