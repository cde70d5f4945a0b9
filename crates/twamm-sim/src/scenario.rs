//! # Scenario Runner
//!
//! Replays a [`SimConfig`] against a pool backed by an in-memory ledger and
//! a manual clock. Each step is recorded with the block it ran at and either
//! its result or the error the pool returned.

use serde::Serialize;
use twamm_core::{
    AccountId, BlockSource, InMemoryLedger, LiquidityResult, LongTermOrder, ManualClock, OrderCancellation,
    OrderPlacement, OrderProceeds, OrderStatus, PoolEvent, ProceedsWithdrawal, SwapResult, Token, TwammError,
    TwammPool, TwammResult, TwammSnapshot,
};

use crate::config::{SimConfig, Step};
use crate::error::{SimError, SimResult};

/// Ledger account holding the pool's tokens
pub const POOL_ACCOUNT: &str = "pool";

type SimPool = TwammPool<InMemoryLedger, ManualClock>;

// ============================================================================
// Report Types
// ============================================================================

/// Outcome of a full scenario run
#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub name: String,
    pub steps: Vec<StepReport>,
    pub final_state: FinalState,
    /// Every event the pool emitted, in order
    pub events: Vec<PoolEvent>,
}

impl SimReport {
    /// Number of steps the pool rejected
    pub fn failed_steps(&self) -> usize {
        self.steps.iter().filter(|step| step.error.is_some()).count()
    }
}

/// Outcome of one step
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub index: usize,
    /// Clock block when the step ran
    pub block: u64,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<StepOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result returned by the pool for a step
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepOutput {
    Clock { block: u64 },
    Swap(SwapResult),
    Liquidity(LiquidityResult),
    OrderPlaced(OrderPlacement),
    Withdrawal(ProceedsWithdrawal),
    Cancellation(OrderCancellation),
    VirtualOrders { last_virtual_order_block: u64 },
    FeeUpdated { fee_bps: u16 },
    PauseToggled { paused: bool },
    Snapshot(PoolSnapshot),
}

/// Pool balances and TWAMM state at one block
#[derive(Debug, Clone, Serialize)]
pub struct PoolSnapshot {
    pub label: String,
    pub block: u64,
    pub reserve_a: u128,
    pub reserve_b: u128,
    pub twamm_reserve_a: u128,
    pub twamm_reserve_b: u128,
    pub total_shares: u128,
    pub fee_bps: u16,
    pub new_orders_paused: bool,
    pub twamm: TwammSnapshot,
}

/// Order view at the end of the run
#[derive(Debug, Clone, Serialize)]
pub struct OrderReport {
    pub order: LongTermOrder,
    pub status: OrderStatus,
    pub remaining_principal: u128,
    pub proceeds: OrderProceeds,
}

/// Token balances and pool shares of one account
#[derive(Debug, Clone, Serialize)]
pub struct AccountBalance {
    pub account: String,
    pub token_a: u128,
    pub token_b: u128,
    pub shares: u128,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinalState {
    pub pool: PoolSnapshot,
    pub orders: Vec<OrderReport>,
    pub balances: Vec<AccountBalance>,
}

// ============================================================================
// Runner
// ============================================================================

pub struct ScenarioRunner {
    config: SimConfig,
    pool: SimPool,
    clock: ManualClock,
}

impl ScenarioRunner {
    /// Fund the configured accounts and seed the pool with initial liquidity
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.validate()?;

        let clock = ManualClock::new(config.pool.start_block);
        let mut ledger = InMemoryLedger::new(POOL_ACCOUNT);
        for funding in &config.accounts {
            let account = AccountId::from(funding.name.as_str());
            ledger
                .mint(&account, Token::A, u128::from(funding.token_a))
                .map_err(TwammError::from)?;
            ledger
                .mint(&account, Token::B, u128::from(funding.token_b))
                .map_err(TwammError::from)?;
        }

        let mut pool = TwammPool::new(config.pool.to_pool_config(), ledger, clock.clone())?;
        let provider = AccountId::from(config.pool.provider.as_str());
        let seeded = pool.initialize(
            &provider,
            u128::from(config.pool.initial_reserve_a),
            u128::from(config.pool.initial_reserve_b),
        )?;
        log::info!(
            "Scenario '{}': pool seeded by {} with {} A / {} B ({} shares)",
            config.name,
            provider,
            seeded.amount_a,
            seeded.amount_b,
            seeded.shares
        );

        Ok(Self { config, pool, clock })
    }

    pub fn pool(&self) -> &SimPool {
        &self.pool
    }

    /// Replay every step and report the final state
    pub fn run(mut self) -> SimResult<SimReport> {
        let steps = std::mem::take(&mut self.config.steps);
        let mut reports = Vec::with_capacity(steps.len());
        let mut events = self.pool.drain_events();

        for (index, step) in steps.iter().enumerate() {
            let block = self.clock.current_block();
            match self.execute(step) {
                Ok(output) => {
                    log::debug!("step {} at block {}: {}", index, block, step);
                    reports.push(StepReport {
                        index,
                        block,
                        action: step.to_string(),
                        output: Some(output),
                        error: None,
                    });
                }
                Err(error) if self.config.stop_on_error => {
                    return Err(SimError::StepFailed {
                        step: index,
                        action: step.to_string(),
                        error,
                    });
                }
                Err(error) => {
                    log::warn!("step {} at block {} failed ({}): {}", index, block, step, error);
                    reports.push(StepReport {
                        index,
                        block,
                        action: step.to_string(),
                        output: None,
                        error: Some(error.to_string()),
                    });
                }
            }
            events.extend(self.pool.drain_events());
        }

        let final_state = self.final_state()?;
        log::info!(
            "Scenario '{}' finished at block {} with {} events",
            self.config.name,
            final_state.pool.block,
            events.len()
        );

        Ok(SimReport {
            name: self.config.name.clone(),
            steps: reports,
            final_state,
            events,
        })
    }

    fn execute(&mut self, step: &Step) -> TwammResult<StepOutput> {
        let output = match step {
            Step::Advance { blocks } => StepOutput::Clock {
                block: self.clock.advance(*blocks),
            },
            Step::AdvanceTo { block } => {
                self.clock.set(*block);
                StepOutput::Clock {
                    block: self.clock.current_block(),
                }
            }
            Step::Swap {
                account,
                direction,
                amount_in,
                min_amount_out,
            } => StepOutput::Swap(self.pool.swap(
                &account_id(account),
                *direction,
                u128::from(*amount_in),
                u128::from(*min_amount_out),
            )?),
            Step::CreateOrder {
                account,
                direction,
                principal,
                intervals,
            } => StepOutput::OrderPlaced(self.pool.create_order(
                &account_id(account),
                *direction,
                u128::from(*principal),
                *intervals,
            )?),
            Step::WithdrawProceeds { account, order_id } => {
                StepOutput::Withdrawal(self.pool.withdraw_proceeds(&account_id(account), *order_id)?)
            }
            Step::CancelOrder { account, order_id } => {
                StepOutput::Cancellation(self.pool.cancel_order(&account_id(account), *order_id)?)
            }
            Step::AddLiquidity {
                account,
                amount_a,
                amount_b,
            } => StepOutput::Liquidity(self.pool.add_liquidity(
                &account_id(account),
                u128::from(*amount_a),
                u128::from(*amount_b),
            )?),
            Step::RemoveLiquidity { account, shares } => {
                StepOutput::Liquidity(self.pool.remove_liquidity(&account_id(account), u128::from(*shares))?)
            }
            Step::ExecuteVirtualOrders { block } => {
                self.pool.execute_virtual_orders(*block)?;
                StepOutput::VirtualOrders {
                    last_virtual_order_block: self.pool.last_virtual_order_block(),
                }
            }
            Step::SetFee { account, fee_bps } => {
                self.pool.set_fee(&account_id(account), *fee_bps)?;
                StepOutput::FeeUpdated { fee_bps: *fee_bps }
            }
            Step::TogglePause { account } => StepOutput::PauseToggled {
                paused: self.pool.toggle_pause_new_orders(&account_id(account))?,
            },
            Step::Snapshot { label } => StepOutput::Snapshot(self.snapshot(label)),
        };
        Ok(output)
    }

    fn snapshot(&self, label: &str) -> PoolSnapshot {
        let (reserve_a, reserve_b) = self.pool.reserves();
        let (twamm_reserve_a, twamm_reserve_b) = self.pool.twamm_reserves();
        PoolSnapshot {
            label: label.to_string(),
            block: self.clock.current_block(),
            reserve_a,
            reserve_b,
            twamm_reserve_a,
            twamm_reserve_b,
            total_shares: self.pool.total_shares(),
            fee_bps: self.pool.fee_bps(),
            new_orders_paused: self.pool.new_orders_paused(),
            twamm: self.pool.twamm_state(),
        }
    }

    fn final_state(&self) -> TwammResult<FinalState> {
        let mut orders = Vec::new();
        for order in self.pool.state().order_book.orders.values() {
            orders.push(OrderReport {
                order: order.clone(),
                status: self.pool.order_status(order.id)?,
                remaining_principal: self.pool.remaining_principal(order.id)?,
                proceeds: self.pool.order_proceeds(order.id)?,
            });
        }

        let mut balances: Vec<AccountBalance> = self
            .config
            .accounts
            .iter()
            .map(|funding| {
                let account = account_id(&funding.name);
                AccountBalance {
                    account: funding.name.clone(),
                    token_a: self.pool.ledger().balance_of(&account, Token::A),
                    token_b: self.pool.ledger().balance_of(&account, Token::B),
                    shares: self.pool.shares_of(&account),
                }
            })
            .collect();
        balances.push(AccountBalance {
            account: POOL_ACCOUNT.to_string(),
            token_a: self.pool.ledger().pool_balance(Token::A),
            token_b: self.pool.ledger().pool_balance(Token::B),
            shares: 0,
        });

        Ok(FinalState {
            pool: self.snapshot("final"),
            orders,
            balances,
        })
    }
}

fn account_id(name: &str) -> AccountId {
    AccountId::from(name)
}
