//! In-memory transactional store.
//!
//! All mutation goes through a [`LedgerTxn`]: the transaction holds the state
//! write lock for its whole lifetime and stages every touched entity in an
//! overlay. `commit` merges the overlay into the base state; dropping the
//! transaction without committing discards it. Readers take the read lock and
//! observe only committed state.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockWriteGuard};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::models::{Account, Market, Order, TokenType, Trade};

type AccountKey = (String, String);

#[derive(Debug, Default)]
struct State {
    markets: HashMap<Uuid, Market>,
    accounts: HashMap<AccountKey, Account>,
    orders: HashMap<Uuid, Order>,
    /// Order ids per market in admission order.
    market_orders: HashMap<Uuid, Vec<Uuid>>,
    trades: Vec<Trade>,
    next_order_seq: u64,
}

/// Authoritative store of markets, accounts, orders and trades.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    state: Arc<RwLock<State>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a transaction. Blocks other writers (and readers) until the
    /// transaction commits or is dropped.
    pub fn begin(&self) -> LedgerTxn<'_> {
        LedgerTxn {
            guard: self.state.write(),
            staged: Staged::default(),
        }
    }

    pub fn market(&self, id: Uuid) -> Result<Market, LedgerError> {
        self.state
            .read()
            .markets
            .get(&id)
            .cloned()
            .ok_or(LedgerError::MarketNotFound(id))
    }

    pub fn markets(&self) -> Vec<Market> {
        let mut markets: Vec<Market> = self.state.read().markets.values().cloned().collect();
        markets.sort_by_key(|m| m.created_at);
        markets
    }

    pub fn order(&self, id: Uuid) -> Result<Order, LedgerError> {
        self.state
            .read()
            .orders
            .get(&id)
            .cloned()
            .ok_or(LedgerError::OrderNotFound(id))
    }

    pub fn account(&self, user_id: &str, chain_id: &str) -> Option<Account> {
        self.state
            .read()
            .accounts
            .get(&(user_id.to_owned(), chain_id.to_owned()))
            .cloned()
    }

    /// OPEN and PARTIAL orders of a market, in admission order.
    pub fn open_orders(&self, market_id: Uuid) -> Vec<Order> {
        let state = self.state.read();
        state
            .market_orders
            .get(&market_id)
            .into_iter()
            .flatten()
            .filter_map(|id| state.orders.get(id))
            .filter(|o| o.is_open())
            .cloned()
            .collect()
    }

    /// Trades of a market in execution order, optionally filtered by token.
    pub fn trades(&self, market_id: Uuid, token_type: Option<TokenType>) -> Vec<Trade> {
        self.state
            .read()
            .trades
            .iter()
            .filter(|t| t.market_id == market_id)
            .filter(|t| token_type.map_or(true, |tt| t.token_type == tt))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Default)]
struct Staged {
    markets: HashMap<Uuid, Market>,
    accounts: HashMap<AccountKey, Account>,
    orders: HashMap<Uuid, Order>,
    new_order_index: Vec<(Uuid, Uuid)>,
    trades: Vec<Trade>,
    next_order_seq: Option<u64>,
}

/// A single atomic unit of ledger mutation. Reads see committed state plus
/// this transaction's own staged writes.
pub struct LedgerTxn<'a> {
    guard: RwLockWriteGuard<'a, State>,
    staged: Staged,
}

impl LedgerTxn<'_> {
    pub fn market(&self, id: Uuid) -> Result<Market, LedgerError> {
        self.staged
            .markets
            .get(&id)
            .or_else(|| self.guard.markets.get(&id))
            .cloned()
            .ok_or(LedgerError::MarketNotFound(id))
    }

    pub fn insert_market(&mut self, market: Market) {
        self.staged.markets.insert(market.id, market);
    }

    /// Terminal market transition. Fails with a conflict if the market was
    /// already settled.
    pub fn mark_settled(&mut self, market_id: Uuid, outcome: TokenType) -> Result<(), LedgerError> {
        let mut market = self.market(market_id)?;
        if market.settled {
            return Err(LedgerError::MarketSettled(market_id));
        }
        market.outcome = Some(outcome);
        market.settled = true;
        self.staged.markets.insert(market_id, market);
        Ok(())
    }

    pub fn account(&self, user_id: &str, chain_id: &str) -> Option<Account> {
        let key = (user_id.to_owned(), chain_id.to_owned());
        self.staged
            .accounts
            .get(&key)
            .or_else(|| self.guard.accounts.get(&key))
            .cloned()
    }

    /// Mutable handle on a (user, chain) ledger entry, created as a zero
    /// record on first reference.
    pub fn account_mut(&mut self, user_id: &str, chain_id: &str) -> &mut Account {
        let key = (user_id.to_owned(), chain_id.to_owned());
        match self.staged.accounts.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(slot) => {
                let account = self
                    .guard
                    .accounts
                    .get(slot.key())
                    .cloned()
                    .unwrap_or_else(|| Account::new(user_id.to_owned(), chain_id.to_owned()));
                slot.insert(account)
            }
        }
    }

    pub fn order(&self, id: Uuid) -> Result<Order, LedgerError> {
        self.staged
            .orders
            .get(&id)
            .or_else(|| self.guard.orders.get(&id))
            .cloned()
            .ok_or(LedgerError::OrderNotFound(id))
    }

    /// Persist a new order, assigning its admission sequence number.
    pub fn insert_order(&mut self, mut order: Order) -> Order {
        let seq = self.staged.next_order_seq.unwrap_or(self.guard.next_order_seq);
        order.seq = seq;
        self.staged.next_order_seq = Some(seq + 1);
        self.staged.new_order_index.push((order.market_id, order.id));
        self.staged.orders.insert(order.id, order.clone());
        order
    }

    pub fn save_order(&mut self, order: Order) {
        self.staged.orders.insert(order.id, order);
    }

    pub fn insert_trade(&mut self, trade: Trade) {
        self.staged.trades.push(trade);
    }

    /// OPEN and PARTIAL orders of a market as this transaction sees them.
    pub fn open_orders(&self, market_id: Uuid) -> Vec<Order> {
        let base_ids = self.guard.market_orders.get(&market_id).into_iter().flatten();
        let staged_ids = self
            .staged
            .new_order_index
            .iter()
            .filter(|(market, _)| *market == market_id)
            .map(|(_, id)| id);
        base_ids
            .chain(staged_ids)
            .filter_map(|id| {
                self.staged
                    .orders
                    .get(id)
                    .or_else(|| self.guard.orders.get(id))
            })
            .filter(|o| o.is_open())
            .cloned()
            .collect()
    }

    /// Every (user, chain) pair holding a position in the market, in a
    /// deterministic order.
    pub fn accounts_in_market(&self, market_id: Uuid) -> Vec<(String, String)> {
        let mut keys: BTreeSet<AccountKey> = BTreeSet::new();
        for (key, account) in self.guard.accounts.iter() {
            if account.positions.contains_key(&market_id) {
                keys.insert(key.clone());
            }
        }
        for (key, account) in self.staged.accounts.iter() {
            if account.positions.contains_key(&market_id) {
                keys.insert(key.clone());
            }
        }
        keys.into_iter().collect()
    }

    /// Apply every staged write to the base state.
    pub fn commit(mut self) {
        let staged = std::mem::take(&mut self.staged);
        let state = &mut *self.guard;
        state.markets.extend(staged.markets);
        state.accounts.extend(staged.accounts);
        state.orders.extend(staged.orders);
        for (market_id, order_id) in staged.new_order_index {
            state.market_orders.entry(market_id).or_default().push(order_id);
        }
        state.trades.extend(staged.trades);
        if let Some(seq) = staged.next_order_seq {
            state.next_order_seq = seq;
        }
    }
}
