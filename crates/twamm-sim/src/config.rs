use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use twamm_core::{AccountId, Direction, PoolConfig};

use crate::error::{SimError, SimResult};

/// Scenario loaded from a TOML file
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SimConfig {
    /// Scenario name for logging and the report
    pub name: String,

    /// Abort on the first failing step instead of recording the failure
    #[serde(default)]
    pub stop_on_error: bool,

    /// Pool parameters and initial liquidity
    pub pool: PoolSettings,

    /// Accounts and the tokens minted to them before the first step
    pub accounts: Vec<AccountFunding>,

    /// Actions replayed in order
    pub steps: Vec<Step>,
}

/// Pool construction parameters
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PoolSettings {
    /// Account allowed to change the fee and pause new orders
    pub owner: String,

    /// Account providing the initial liquidity
    pub provider: String,

    /// Block the simulation starts at
    #[serde(default)]
    pub start_block: u64,

    /// Order expiries fall on multiples of this many blocks
    pub block_interval: u64,

    /// Trading fee (basis points)
    pub fee_bps: u16,

    /// Unused deposit tolerated by add_liquidity (basis points)
    pub liquidity_tolerance_bps: u16,

    pub initial_reserve_a: u64,
    pub initial_reserve_b: u64,
}

/// Tokens minted to an account
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AccountFunding {
    pub name: String,
    pub token_a: u64,
    pub token_b: u64,
}

/// One scripted action
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Move the clock forward by `blocks`
    Advance { blocks: u64 },
    /// Move the clock to `block`
    AdvanceTo { block: u64 },
    Swap {
        account: String,
        direction: Direction,
        amount_in: u64,
        #[serde(default)]
        min_amount_out: u64,
    },
    CreateOrder {
        account: String,
        direction: Direction,
        principal: u64,
        intervals: u64,
    },
    WithdrawProceeds { account: String, order_id: u64 },
    CancelOrder { account: String, order_id: u64 },
    AddLiquidity { account: String, amount_a: u64, amount_b: u64 },
    RemoveLiquidity { account: String, shares: u64 },
    /// Execute virtual orders up to `block` without a trade
    ExecuteVirtualOrders { block: u64 },
    SetFee { account: String, fee_bps: u16 },
    TogglePause { account: String },
    /// Record the pool state in the report
    Snapshot { label: String },
}

impl Step {
    /// Account acting in this step, if any
    pub fn account(&self) -> Option<&str> {
        match self {
            Step::Swap { account, .. }
            | Step::CreateOrder { account, .. }
            | Step::WithdrawProceeds { account, .. }
            | Step::CancelOrder { account, .. }
            | Step::AddLiquidity { account, .. }
            | Step::RemoveLiquidity { account, .. }
            | Step::SetFee { account, .. }
            | Step::TogglePause { account } => Some(account),
            Step::Advance { .. }
            | Step::AdvanceTo { .. }
            | Step::ExecuteVirtualOrders { .. }
            | Step::Snapshot { .. } => None,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Advance { blocks } => write!(f, "advance {} blocks", blocks),
            Step::AdvanceTo { block } => write!(f, "advance to block {}", block),
            Step::Swap { account, direction, amount_in, .. } => {
                write!(f, "{} swaps {} {}", account, amount_in, direction)
            }
            Step::CreateOrder { account, direction, principal, intervals } => write!(
                f,
                "{} sells {} {} over {} intervals",
                account, principal, direction, intervals
            ),
            Step::WithdrawProceeds { account, order_id } => {
                write!(f, "{} withdraws order {}", account, order_id)
            }
            Step::CancelOrder { account, order_id } => write!(f, "{} cancels order {}", account, order_id),
            Step::AddLiquidity { account, amount_a, amount_b } => {
                write!(f, "{} adds {} A / {} B", account, amount_a, amount_b)
            }
            Step::RemoveLiquidity { account, shares } => write!(f, "{} removes {} shares", account, shares),
            Step::ExecuteVirtualOrders { block } => write!(f, "execute virtual orders to {}", block),
            Step::SetFee { account, fee_bps } => write!(f, "{} sets fee to {} bps", account, fee_bps),
            Step::TogglePause { account } => write!(f, "{} toggles pause", account),
            Step::Snapshot { label } => write!(f, "snapshot '{}'", label),
        }
    }
}

impl SimConfig {
    /// Load configuration from TOML file
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SimConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> SimResult<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SimResult<()> {
        if self.name.is_empty() {
            return Err(SimError::invalid_config("name must not be empty"));
        }

        self.pool
            .to_pool_config()
            .validate()
            .map_err(|e| SimError::invalid_config(format!("pool: {}", e)))?;
        if self.pool.initial_reserve_a == 0 || self.pool.initial_reserve_b == 0 {
            return Err(SimError::invalid_config("initial reserves must be greater than 0"));
        }

        let mut names = BTreeSet::new();
        for account in &self.accounts {
            if account.name.is_empty() {
                return Err(SimError::invalid_config("account name must not be empty"));
            }
            if !names.insert(account.name.as_str()) {
                return Err(SimError::invalid_config(format!("duplicate account '{}'", account.name)));
            }
        }
        if !names.contains(self.pool.provider.as_str()) {
            return Err(SimError::invalid_config(format!(
                "liquidity provider '{}' is not a funded account",
                self.pool.provider
            )));
        }

        let mut block = self.pool.start_block;
        for (index, step) in self.steps.iter().enumerate() {
            if let Some(account) = step.account() {
                if !names.contains(account) && account != self.pool.owner {
                    return Err(SimError::invalid_config(format!(
                        "step {} uses unknown account '{}'",
                        index, account
                    )));
                }
            }
            match step {
                Step::Advance { blocks } => block = block.saturating_add(*blocks),
                Step::AdvanceTo { block: target } => {
                    if *target < block {
                        return Err(SimError::invalid_config(format!(
                            "step {} moves the clock back from {} to {}",
                            index, block, target
                        )));
                    }
                    block = *target;
                }
                _ => {}
            }
        }

        Ok(())
    }
}

impl PoolSettings {
    /// Core pool parameters
    pub fn to_pool_config(&self) -> PoolConfig {
        PoolConfig {
            block_interval: self.block_interval,
            fee_bps: self.fee_bps,
            liquidity_tolerance_bps: self.liquidity_tolerance_bps,
            owner: AccountId::from(self.owner.as_str()),
        }
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        let core = PoolConfig::default();
        Self {
            owner: core.owner.to_string(),
            provider: "lp".to_string(),
            start_block: 0,
            block_interval: core.block_interval,
            fee_bps: core.fee_bps,
            liquidity_tolerance_bps: core.liquidity_tolerance_bps,
            initial_reserve_a: 1_000_000,
            initial_reserve_b: 1_000_000,
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            name: "empty".to_string(),
            stop_on_error: false,
            pool: PoolSettings::default(),
            accounts: vec![AccountFunding {
                name: "lp".to_string(),
                token_a: 1_000_000,
                token_b: 1_000_000,
            }],
            steps: vec![],
        }
    }
}

/// Create example configuration file: two opposing orders over 10 intervals
/// against a 1,000,000 / 1,000,000 pool, withdrawn at expiry
pub fn create_example_config(path: impl AsRef<Path>) -> SimResult<()> {
    let funded = |name: &str| AccountFunding {
        name: name.to_string(),
        token_a: 100_000_000,
        token_b: 100_000_000,
    };
    let example_config = SimConfig {
        name: "opposing-orders".to_string(),
        stop_on_error: false,
        pool: PoolSettings::default(),
        accounts: vec![funded("lp"), funded("alice"), funded("bob"), funded("carol")],
        steps: vec![
            Step::CreateOrder {
                account: "alice".to_string(),
                direction: Direction::AToB,
                principal: 10_000,
                intervals: 10,
            },
            Step::CreateOrder {
                account: "bob".to_string(),
                direction: Direction::BToA,
                principal: 10_000,
                intervals: 10,
            },
            Step::AdvanceTo { block: 50 },
            Step::Snapshot {
                label: "halfway".to_string(),
            },
            Step::Swap {
                account: "carol".to_string(),
                direction: Direction::AToB,
                amount_in: 5_000,
                min_amount_out: 0,
            },
            Step::WithdrawProceeds {
                account: "alice".to_string(),
                order_id: 0,
            },
            Step::AdvanceTo { block: 100 },
            Step::WithdrawProceeds {
                account: "alice".to_string(),
                order_id: 0,
            },
            Step::WithdrawProceeds {
                account: "bob".to_string(),
                order_id: 1,
            },
            Step::Snapshot {
                label: "expired".to_string(),
            },
        ],
    };

    example_config.save(path)?;
    Ok(())
}
