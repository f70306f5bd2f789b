use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::payload::opponents;
use shared::{
    Candy, CandyKind, Direction, Field, GameState, Map, Payload, PerkKind, Position, Snake,
    SnakeView, CANDIES_PER_LEVEL, DASH_STEPS, GROW_AMOUNT, MAX_LEVEL, MAX_PERK_CANDIES,
    PERK_CANDY_CHANCE,
};

/// What a snake's head ran into after a move. When several apply, the
/// earlier variant wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    Wall,
    OwnBody,
    Snake { other: usize },
    Candy(Candy),
}

/// The authoritative simulation. Every change to players, candies or the
/// map goes through here, driven by the server loop.
#[derive(Debug, Clone)]
pub struct Game {
    level: u16,
    map: Map,
    state: GameState,
    snakes: Vec<Snake>,
    candies: Vec<Candy>,
    rng: StdRng,
}

impl Game {
    pub fn new(players: usize, width: u16, height: u16) -> Self {
        Self::with_rng(players, width, height, StdRng::from_entropy())
    }

    /// Same as [`Game::new`] but with reproducible spawns and candy drops.
    pub fn with_seed(players: usize, width: u16, height: u16, seed: u64) -> Self {
        Self::with_rng(players, width, height, StdRng::seed_from_u64(seed))
    }

    fn with_rng(players: usize, width: u16, height: u16, rng: StdRng) -> Self {
        assert!(
            width > 3 && height > 3,
            "board of {}x{} has no interior",
            width,
            height
        );

        let mut game = Self {
            level: 1,
            map: Map::new(1, width, height),
            state: GameState::Paused,
            snakes: Vec::with_capacity(players),
            candies: Vec::new(),
            rng,
        };
        for _ in 0..players {
            let head = game.random_position();
            let direction = game.open_direction(head);
            game.snakes.push(Snake::new(head, direction));
        }
        game.refill_candies();
        game
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn level(&self) -> u16 {
        self.level
    }

    pub fn width(&self) -> u16 {
        self.map.width()
    }

    pub fn height(&self) -> u16 {
        self.map.height()
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn players(&self) -> &[Snake] {
        &self.snakes
    }

    pub fn player_count(&self) -> usize {
        self.snakes.len()
    }

    pub fn candies(&self) -> &[Candy] {
        &self.candies
    }

    /// Flips between `Paused` and `Ongoing`. Finished states are left alone.
    pub fn toggle_paused(&mut self) {
        self.state = match self.state {
            GameState::Paused => GameState::Ongoing,
            GameState::Ongoing => GameState::Paused,
            other => other,
        };
        debug!("Game state is now {:?}", self.state);
    }

    pub fn change_direction(&mut self, player: usize, direction: Direction) -> bool {
        self.snakes
            .get_mut(player)
            .map_or(false, |snake| snake.change_direction(direction))
    }

    /// Moves every snake one cell, then resolves what their heads hit.
    pub fn tick(&mut self) {
        if self.state != GameState::Ongoing {
            return;
        }

        for index in 0..self.snakes.len() {
            self.advance(index);
        }

        // Resolved after everyone moved, so a head-on meeting costs both
        // snakes a life.
        let mut crashed = false;
        for index in 0..self.snakes.len() {
            crashed |= self.resolve(index);
        }
        if crashed {
            self.end_round();
            return;
        }

        self.check_level_up();
        if self.state == GameState::Ongoing {
            self.maybe_spawn_perk_candy();
        }
    }

    /// Spends a dash charge and moves `player` up to `DASH_STEPS` cells on
    /// its own. Returns false when nothing happened.
    pub fn dash(&mut self, player: usize) -> bool {
        if self.state != GameState::Ongoing {
            return false;
        }
        let Some(snake) = self.snakes.get_mut(player) else {
            return false;
        };
        if !snake.perks.use_perk(PerkKind::Dash) {
            return false;
        }

        debug!("Player {} dashes", player);
        for _ in 0..DASH_STEPS {
            if self.state != GameState::Ongoing {
                break;
            }
            self.advance(player);
            if self.resolve(player) {
                self.end_round();
            }
        }
        true
    }

    /// Leaves a finished round or game. After `RoundFinished` the snakes
    /// respawn keeping lives, score and level. From anywhere else the whole
    /// game restarts at level 1.
    pub fn reset(&mut self) {
        if self.state == GameState::RoundFinished {
            self.respawn_snakes();
            self.refill_candies();
            info!("Starting round on level {}", self.level);
        } else {
            self.restart();
        }
        self.state = GameState::Ongoing;
    }

    /// Fresh game at level 1 with new snakes, waiting for a confirm.
    pub fn restart(&mut self) {
        let players = self.snakes.len();
        self.level = 1;
        self.map = Map::new(1, self.map.width(), self.map.height());
        self.snakes.clear();
        for _ in 0..players {
            let head = self.random_position();
            let direction = self.open_direction(head);
            self.snakes.push(Snake::new(head, direction));
        }
        self.refill_candies();
        self.state = GameState::Paused;
        info!("New game for {} players", players);
    }

    pub fn field(&self, player: usize, pos: Position) -> Field {
        if self.map.is_wall(pos) {
            return Field::Wall;
        }
        if let Some(candy) = self.candies.iter().find(|c| c.position == pos) {
            return Field::Candy(candy.kind);
        }
        match self.snakes.iter().position(|s| s.contains(pos)) {
            Some(index) if index == player => Field::OwnSnake,
            Some(_) => Field::Opponent,
            None => Field::Empty,
        }
    }

    /// The state as seen by `player`: their snake first, everyone else in
    /// player order.
    pub fn payload_for(&self, player: usize) -> Option<Payload> {
        let views: Vec<SnakeView> = self.snakes.iter().map(SnakeView::from).collect();
        let own = views.get(player)?.clone();

        Some(Payload {
            map_level: self.level,
            state: self.state,
            candies: self.candies.clone(),
            player: own,
            opponents: opponents(&views, player),
        })
    }

    fn advance(&mut self, index: usize) {
        let (width, height) = (self.map.width(), self.map.height());
        let snake = &mut self.snakes[index];
        snake.advance();

        if snake.perks.use_perk(PerkKind::WallWalk) {
            match wrap_around(snake.head(), width, height) {
                Some(pos) => {
                    debug!("Player {} walks through the wall to {:?}", index, pos);
                    snake.relocate_head(pos);
                }
                None => snake.perks.refund(PerkKind::WallWalk),
            }
        }
    }

    fn collision(&self, index: usize) -> Option<Collision> {
        let snake = &self.snakes[index];
        let head = snake.head();

        if self.map.is_wall(head) {
            return Some(Collision::Wall);
        }
        if snake.body().any(|pos| *pos == head) {
            return Some(Collision::OwnBody);
        }
        let hit = self
            .snakes
            .iter()
            .enumerate()
            .find(|(other, s)| *other != index && s.contains(head));
        if let Some((other, _)) = hit {
            return Some(Collision::Snake { other });
        }
        self.candies
            .iter()
            .find(|c| c.position == head)
            .map(|c| Collision::Candy(*c))
    }

    /// Applies whatever `index` ran into. Returns true if it crashed.
    fn resolve(&mut self, index: usize) -> bool {
        match self.collision(index) {
            None => false,
            Some(Collision::Candy(candy)) => {
                self.eat(index, candy);
                false
            }
            Some(collision) => {
                let snake = &mut self.snakes[index];
                snake.crash();
                info!(
                    "Player {} crashed ({:?}), {} lives left",
                    index, collision, snake.lives
                );
                true
            }
        }
    }

    fn eat(&mut self, index: usize, candy: Candy) {
        self.candies.retain(|c| c.position != candy.position);
        let snake = &mut self.snakes[index];

        match candy.kind.perk() {
            Some(perk) => snake.perks.reload(perk, 1),
            None => {
                snake.eat();
                let pos = self.random_position();
                self.candies.push(Candy::grow(pos));
            }
        }
        debug!("Player {} ate {:?}", index, candy.kind);
    }

    fn end_round(&mut self) {
        self.state = if self.snakes.iter().any(|s| !s.is_alive()) {
            GameState::GameFinished
        } else {
            GameState::RoundFinished
        };
        info!("Round over on level {}: {:?}", self.level, self.state);
    }

    fn check_level_up(&mut self) {
        let mass: usize = self.snakes.iter().map(Snake::growth_mass).sum();
        let grown = mass.saturating_sub(self.snakes.len());
        if grown / usize::from(GROW_AMOUNT) < CANDIES_PER_LEVEL {
            return;
        }

        if self.level >= MAX_LEVEL {
            self.state = GameState::GameFinished;
            info!("Final level {} cleared", self.level);
            return;
        }

        self.level += 1;
        self.map = Map::new(self.level, self.map.width(), self.map.height());
        self.state = GameState::RoundFinished;
        info!("Advancing to level {}", self.level);
    }

    fn maybe_spawn_perk_candy(&mut self) {
        let perk_candies = self
            .candies
            .iter()
            .filter(|c| c.kind != CandyKind::Grow)
            .count();
        if perk_candies >= MAX_PERK_CANDIES || !self.rng.gen_ratio(1, PERK_CANDY_CHANCE) {
            return;
        }

        let kind = if self.rng.gen_bool(0.5) {
            CandyKind::Dash
        } else {
            CandyKind::WallWalk
        };
        let pos = self.random_position();
        self.candies.push(Candy::new(kind, pos));
        debug!("Spawned {:?} candy at {:?}", kind, pos);
    }

    fn respawn_snakes(&mut self) {
        for mut snake in std::mem::take(&mut self.snakes) {
            let head = self.random_position();
            let direction = self.open_direction(head);
            snake.respawn(head, direction);
            self.snakes.push(snake);
        }
    }

    /// One grow candy per player.
    fn refill_candies(&mut self) {
        self.candies.clear();
        for _ in 0..self.snakes.len().max(1) {
            let pos = self.random_position();
            self.candies.push(Candy::grow(pos));
        }
    }

    fn is_free(&self, pos: Position) -> bool {
        !self.map.is_wall(pos)
            && !self.snakes.iter().any(|s| s.contains(pos))
            && !self.candies.iter().any(|c| c.position == pos)
    }

    /// Draws interior cells until one is free. Assumes the board never
    /// fills up.
    fn random_position(&mut self) -> Position {
        loop {
            let pos = Position::new(
                self.rng.gen_range(2..self.map.height()),
                self.rng.gen_range(2..self.map.width()),
            );
            if self.is_free(pos) {
                return pos;
            }
        }
    }

    /// The direction with the longest free run ahead of `pos`, looking at
    /// most `DASH_STEPS` cells. Ties prefer facing the far side of the board.
    fn open_direction(&self, pos: Position) -> Direction {
        let toward_center = if pos.x <= self.map.width() / 2 {
            Direction::East
        } else {
            Direction::West
        };
        let candidates = [
            toward_center,
            toward_center.opposite(),
            Direction::South,
            Direction::North,
        ];

        let mut best = (toward_center, 0);
        for direction in candidates {
            let mut cell = pos;
            let mut run = 0;
            while run < DASH_STEPS {
                cell = cell.step(direction);
                if !self.is_free(cell) {
                    break;
                }
                run += 1;
            }
            if run > best.1 {
                best = (direction, run);
            }
        }
        best.0
    }
}

/// The cell on the opposite side of the board for a head that stepped onto
/// the border, or `None` when it is still inside.
fn wrap_around(head: Position, width: u16, height: u16) -> Option<Position> {
    let mut pos = head;
    if pos.x >= width {
        pos.x = 2;
    } else if pos.x <= 1 {
        pos.x = width - 1;
    } else if pos.y >= height {
        pos.y = 2;
    } else if pos.y <= 1 {
        pos.y = height - 1;
    } else {
        return None;
    }
    Some(pos)
}
