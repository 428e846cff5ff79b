//! The trading core: order admission with asset locking, price-time priority
//! matching, trade execution with short-sale minting, and market settlement.
//!
//! All writes that touch one market are serialized behind a per-market async
//! mutex; the ledger's transactions make each step atomic within that.

mod admission;
pub mod book;
mod deposits;
pub mod error;
mod executor;
mod matching;
mod settlement;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use ledger::{Account, Ledger, Market, Order, Side, TokenType, Trade};
use sigverify::{OrderMessage, SignatureProof, SignatureVerifier};
use uuid::Uuid;

pub use book::{BookLevel, MarketBook, SideBook};
pub use deposits::{CreditDeposit, DepositReceipt};
pub use error::EngineError;

/// A new limit order as received from transport. `price` is the client's
/// textual form; it is parsed here and passed verbatim to the signature
/// verifier so the signed message reconstructs byte for byte.
#[derive(Debug, Clone)]
pub struct SubmitOrder {
    pub market_id: String,
    pub user_id: String,
    pub chain_id: String,
    pub side: Side,
    pub token_type: TokenType,
    pub price: String,
    pub quantity: u64,
    pub proof: SignatureProof,
    pub deadline: Option<Instant>,
}

/// The admitted order in its post-matching state, plus the fills the
/// matching pass produced, in execution order.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub order: Order,
    pub fills: Vec<Trade>,
}

/// The exchange core. Owns its collaborators; holds no process-wide state.
pub struct Engine {
    ledger: Ledger,
    verifier: SignatureVerifier,
    market_locks: parking_lot::Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl Engine {
    pub fn new(ledger: Ledger, verifier: SignatureVerifier) -> Self {
        Self {
            ledger,
            verifier,
            market_locks: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    fn market_lock(&self, market_id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        self.market_locks.lock().entry(market_id).or_default().clone()
    }

    pub fn create_market(
        &self,
        question: &str,
        creator: &str,
        resolves_at: DateTime<Utc>,
    ) -> Result<Market, EngineError> {
        if question.trim().is_empty() {
            return Err(EngineError::MissingField("question"));
        }
        if creator.trim().is_empty() {
            return Err(EngineError::MissingField("creator"));
        }
        let market = Market::new(question.to_owned(), creator.to_owned(), resolves_at);
        let mut txn = self.ledger.begin();
        txn.insert_market(market.clone());
        txn.commit();
        tracing::info!(market_id = %market.id, question, "market created");
        Ok(market)
    }

    /// Admit a signed limit order and run it against the book as the taker.
    /// Blocks until matching quiesces; the returned order is FILLED,
    /// PARTIAL, or resting OPEN.
    pub async fn submit_order(&self, req: SubmitOrder) -> Result<SubmitOutcome, EngineError> {
        check_deadline(req.deadline)?;
        if req.chain_id.trim().is_empty() {
            return Err(EngineError::InvalidChain("empty chain id".into()));
        }
        if req.user_id.trim().is_empty() {
            return Err(EngineError::MissingField("user_id"));
        }

        // Authorization and validation fail before any locking.
        let side_text = req.side.to_string();
        let token_text = req.token_type.to_string();
        let message = OrderMessage {
            market_id: &req.market_id,
            user_id: &req.user_id,
            side: &side_text,
            price: &req.price,
            quantity: req.quantity,
            token_type: &token_text,
        };
        self.verifier.verify_order(&req.chain_id, &message, &req.proof)?;

        let price = admission::validate(&req)?;
        let market_id = Uuid::parse_str(&req.market_id)
            .map_err(|_| EngineError::MarketNotFound(req.market_id.clone()))?;

        let lock = self.market_lock(market_id);
        let _guard = lock.lock().await;
        check_deadline(req.deadline)?;

        let order = admission::admit(&self.ledger, market_id, &req, price)?;
        tracing::info!(
            order_id = %order.id,
            market_id = %market_id,
            user_id = %req.user_id,
            side = %order.side,
            token = %order.token_type,
            price = %order.price,
            quantity = order.quantity,
            "order admitted"
        );

        let fills = matching::run(&self.ledger, &order)?;
        let order = self.ledger.order(order.id)?;
        Ok(SubmitOutcome { order, fills })
    }

    /// Settle a market at its final outcome. Idempotent rejection on repeat.
    pub async fn settle_market(
        &self,
        market_id: Uuid,
        outcome: TokenType,
    ) -> Result<Market, EngineError> {
        let lock = self.market_lock(market_id);
        let _guard = lock.lock().await;
        settlement::settle(&self.ledger, market_id, outcome)
    }

    /// Deposit ingress from the chain indexer. Idempotent by block height.
    pub fn credit_deposit(&self, req: &CreditDeposit) -> Result<DepositReceipt, EngineError> {
        deposits::credit(&self.ledger, req)
    }

    // --- Read side ---

    pub fn market(&self, market_id: Uuid) -> Result<Market, EngineError> {
        Ok(self.ledger.market(market_id)?)
    }

    pub fn markets(&self) -> Vec<Market> {
        self.ledger.markets()
    }

    pub fn open_orders(&self, market_id: Uuid) -> Result<Vec<Order>, EngineError> {
        self.ledger.market(market_id)?;
        Ok(self.ledger.open_orders(market_id))
    }

    pub fn trades(
        &self,
        market_id: Uuid,
        token_type: Option<TokenType>,
    ) -> Result<Vec<Trade>, EngineError> {
        self.ledger.market(market_id)?;
        Ok(self.ledger.trades(market_id, token_type))
    }

    pub fn book(&self, market_id: Uuid) -> Result<MarketBook, EngineError> {
        book::snapshot(&self.ledger, market_id)
    }

    pub fn balance(&self, user_id: &str, chain_id: &str) -> Option<Account> {
        self.ledger.account(user_id, chain_id)
    }
}

fn check_deadline(deadline: Option<Instant>) -> Result<(), EngineError> {
    match deadline {
        Some(d) if Instant::now() >= d => Err(EngineError::DeadlineExceeded),
        _ => Ok(()),
    }
}
