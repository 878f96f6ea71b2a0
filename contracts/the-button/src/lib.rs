#![no_std]

//! # The Button
//!
//! A pay-to-play custody game. Anyone may press the button by paying the exact
//! press fee, which makes them the current claimant and restarts the wait
//! window. If nobody else presses before the window elapses, the claimant may
//! withdraw the whole treasure. Pressing after someone else displaces them and
//! carries the treasure over.
//!
//! ## Flow
//! 1. `press_button` pulls `press_fee` tokens from the presser into custody.
//! 2. Another address pressing resets the clock: `last_press_block` moves to
//!    the current ledger sequence and the treasure grows by one fee.
//! 3. Once `sequence > last_press_block + treasure_wait`, the last presser calls
//!    `claim_treasure` and receives the full treasure.
//!
//! ## Post-claim reset
//! The deployer picks a [`ResetPolicy`]. `Clear` forgets the winner so the game
//! starts from scratch; `Retain` keeps `last_presser` / `last_press_block`
//! after the payout.
//!
//! ## History
//! Every accepted press and claim publishes a contract event and appends a
//! [`ButtonEvent`] to a persistent, append-only record log readable page by
//! page with `get_events`.

use soroban_sdk::{
    contract, contractclient, contracterror, contractevent, contractimpl, contracttype, log,
    panic_with_error, Address, Env, Vec,
};

// ═══════════════════════════════════════════════════════════════════════════════
//  Contract Events
// ═══════════════════════════════════════════════════════════════════════════════

#[contractevent]
pub struct ButtonPressed {
    pub presser: Address,
}

#[contractevent]
pub struct TreasureClaimed {
    pub claimant: Address,
    pub amount: i128,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  External trait interfaces
// ═══════════════════════════════════════════════════════════════════════════════

/// Subset of the token interface the button needs to hold and pay out funds.
/// Any SEP-41 token (including a Stellar Asset Contract) satisfies it.
#[contractclient(name = "TreasuryTokenClient")]
pub trait TreasuryToken {
    fn transfer(env: Env, from: Address, to: Address, amount: i128);
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Errors
// ═══════════════════════════════════════════════════════════════════════════════

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum ButtonError {
    FeeMismatch = 1,
    RepeatCaller = 2,
    WindowNotElapsed = 3,
    NotClaimant = 4,
    TreasureEmpty = 5,
    PotOverflow = 6,
    NotInitialized = 7,
    InvalidConfig = 8,
    HistoryGap = 9,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  State, config & storage keys
// ═══════════════════════════════════════════════════════════════════════════════

#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ResetPolicy {
    /// Clear `last_presser` and `last_press_block` after a payout.
    Clear = 0,
    /// Leave the winner recorded after a payout.
    Retain = 1,
}

/// Fixed at deployment, never written again.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ButtonConfig {
    pub token: Address,
    pub press_fee: i128,
    pub treasure_wait: u32,
    pub reset_policy: ResetPolicy,
}

/// The mutable half of the ledger. Only `press_button` and `claim_treasure`
/// write it, always as a whole.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ButtonState {
    pub last_presser: Option<Address>,
    pub last_press_block: u32,
    pub treasure: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EvRecordPressed {
    pub presser: Address,
    pub ledger: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EvRecordClaimed {
    pub claimant: Address,
    pub amount: i128,
    pub ledger: u32,
}

/// Entry of the append-only record log.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ButtonEvent {
    Pressed(EvRecordPressed),
    Claimed(EvRecordClaimed),
}

#[contracttype]
#[derive(Clone)]
enum StorageKey {
    Config,
    State,
    EventCount,
    /// Record log entry by zero-based index.
    Event(u32),
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Constants
// ═══════════════════════════════════════════════════════════════════════════════

// Ledger rate is approximately 5 seconds per ledger on Stellar
const LEDGER_RATE_SECS: u32 = 5;

// TTL for config and game state (30 days)
const TTL_SECONDS: u32 = 30 * 24 * 60 * 60; // 2,592,000 seconds

/// TTL for instance storage in ledgers: 30 * 24 * 60 * 60 / 5 = 518,400 ledgers
const INSTANCE_TTL_LEDGERS: u32 = TTL_SECONDS / LEDGER_RATE_SECS;

// History TTL: 120 days, persistent storage for the record log
const HISTORY_TTL_SECONDS: u32 = 120 * 24 * 60 * 60; // 10,368,000 seconds
const HISTORY_TTL_LEDGERS: u32 = HISTORY_TTL_SECONDS / LEDGER_RATE_SECS; // 2,073,600 ledgers

/// Upper bound on a single `get_events` page.
pub const MAX_EVENTS_PER_PAGE: u32 = 100;

// ═══════════════════════════════════════════════════════════════════════════════
//  Contract
// ═══════════════════════════════════════════════════════════════════════════════

#[contract]
pub struct TheButton;

#[contractimpl]
impl TheButton {
    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Constructor
    // ───────────────────────────────────────────────────────────────────────────

    pub fn __constructor(
        env: Env,
        token: Address,
        press_fee: i128,
        treasure_wait: u32,
        reset_policy: ResetPolicy,
    ) {
        if press_fee <= 0 {
            panic_with_error!(&env, ButtonError::InvalidConfig);
        }

        let config = ButtonConfig {
            token,
            press_fee,
            treasure_wait,
            reset_policy,
        };
        let state = ButtonState {
            last_presser: None,
            last_press_block: 0,
            treasure: 0,
        };

        env.storage().instance().set(&StorageKey::Config, &config);
        env.storage().instance().set(&StorageKey::EventCount, &0u32);
        Self::write_state(&env, &state);
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Press
    // ───────────────────────────────────────────────────────────────────────────

    /// Pay exactly `press_fee` to become the last presser.
    ///
    /// The caller may not press twice in a row. On success the treasure grows
    /// by one fee and the wait window restarts at the current ledger.
    pub fn press_button(env: Env, presser: Address, amount: i128) -> Result<(), ButtonError> {
        presser.require_auth();

        let config = Self::load_config(&env)?;
        let mut state = Self::load_state(&env)?;

        if amount != config.press_fee {
            return Err(ButtonError::FeeMismatch);
        }
        if state.last_presser.as_ref() == Some(&presser) {
            return Err(ButtonError::RepeatCaller);
        }

        let treasure = state
            .treasure
            .checked_add(config.press_fee)
            .ok_or(ButtonError::PotOverflow)?;
        let sequence = env.ledger().sequence();

        state.treasure = treasure;
        state.last_presser = Some(presser.clone());
        state.last_press_block = sequence;
        Self::write_state(&env, &state);

        // A failed pull (insufficient balance, missing auth) aborts the
        // invocation and the host discards the state write above.
        let token = TreasuryTokenClient::new(&env, &config.token);
        token.transfer(&presser, &env.current_contract_address(), &config.press_fee);

        log!(&env, "button pressed", presser, sequence, treasure);

        Self::append_event(
            &env,
            ButtonEvent::Pressed(EvRecordPressed {
                presser: presser.clone(),
                ledger: sequence,
            }),
        );
        ButtonPressed { presser }.publish(&env);

        Ok(())
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Claim
    // ───────────────────────────────────────────────────────────────────────────

    /// Withdraw the whole treasure.
    ///
    /// Only the last presser may claim, and only once more than
    /// `treasure_wait` ledgers have passed since their press.
    pub fn claim_treasure(env: Env, claimant: Address) -> Result<(), ButtonError> {
        claimant.require_auth();

        let config = Self::load_config(&env)?;
        let mut state = Self::load_state(&env)?;
        let sequence = env.ledger().sequence();

        if sequence <= state.last_press_block.saturating_add(config.treasure_wait) {
            return Err(ButtonError::WindowNotElapsed);
        }
        if state.last_presser.as_ref() != Some(&claimant) {
            return Err(ButtonError::NotClaimant);
        }
        if state.treasure == 0 {
            return Err(ButtonError::TreasureEmpty);
        }

        let amount = state.treasure;
        state.treasure = 0;
        if config.reset_policy == ResetPolicy::Clear {
            state.last_presser = None;
            state.last_press_block = 0;
        }

        // State is final before the payout leaves the contract.
        Self::write_state(&env, &state);

        let token = TreasuryTokenClient::new(&env, &config.token);
        token.transfer(&env.current_contract_address(), &claimant, &amount);

        log!(&env, "treasure claimed", claimant, amount, sequence);

        Self::append_event(
            &env,
            ButtonEvent::Claimed(EvRecordClaimed {
                claimant: claimant.clone(),
                amount,
                ledger: sequence,
            }),
        );
        TreasureClaimed { claimant, amount }.publish(&env);

        Ok(())
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Read
    // ───────────────────────────────────────────────────────────────────────────

    pub fn press_fee(env: Env) -> Result<i128, ButtonError> {
        Ok(Self::load_config(&env)?.press_fee)
    }

    pub fn treasure_wait(env: Env) -> Result<u32, ButtonError> {
        Ok(Self::load_config(&env)?.treasure_wait)
    }

    pub fn token(env: Env) -> Result<Address, ButtonError> {
        Ok(Self::load_config(&env)?.token)
    }

    pub fn reset_policy(env: Env) -> Result<ResetPolicy, ButtonError> {
        Ok(Self::load_config(&env)?.reset_policy)
    }

    pub fn last_presser(env: Env) -> Result<Option<Address>, ButtonError> {
        Ok(Self::load_state(&env)?.last_presser)
    }

    pub fn last_press_block(env: Env) -> Result<u32, ButtonError> {
        Ok(Self::load_state(&env)?.last_press_block)
    }

    /// Funds currently held for the next winner.
    pub fn treasure(env: Env) -> Result<i128, ButtonError> {
        Ok(Self::load_state(&env)?.treasure)
    }

    pub fn get_state(env: Env) -> Result<ButtonState, ButtonError> {
        Self::load_state(&env)
    }

    /// First ledger sequence at which the last presser may claim, or `None`
    /// when nobody holds the button.
    ///
    /// Returns `None` as well when the window would end past `u32::MAX`.
    pub fn claimable_from(env: Env) -> Result<Option<u32>, ButtonError> {
        let config = Self::load_config(&env)?;
        let state = Self::load_state(&env)?;
        if state.last_presser.is_none() {
            return Ok(None);
        }
        Ok(state
            .last_press_block
            .checked_add(config.treasure_wait)
            .and_then(|end| end.checked_add(1)))
    }

    pub fn event_count(env: Env) -> u32 {
        Self::load_event_count(&env)
    }

    /// Read the record log from index `start`, at most `limit` entries
    /// (capped at [`MAX_EVENTS_PER_PAGE`]). Past the end yields an empty page.
    ///
    /// Every index below `event_count` is written exactly once; an expired or
    /// missing entry surfaces as `HistoryGap` instead of a short page.
    pub fn get_events(env: Env, start: u32, limit: u32) -> Result<Vec<ButtonEvent>, ButtonError> {
        let count = Self::load_event_count(&env);
        let limit = limit.min(MAX_EVENTS_PER_PAGE);
        let end = start.saturating_add(limit).min(count);

        let mut page = Vec::new(&env);
        for index in start..end {
            let event = env
                .storage()
                .persistent()
                .get::<StorageKey, ButtonEvent>(&StorageKey::Event(index))
                .ok_or(ButtonError::HistoryGap)?;
            page.push_back(event);
        }
        Ok(page)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  Internal: Storage
    // ═══════════════════════════════════════════════════════════════════════════

    fn append_event(env: &Env, event: ButtonEvent) {
        let index = Self::load_event_count(env);
        let key = StorageKey::Event(index);
        env.storage().persistent().set(&key, &event);
        env.storage()
            .persistent()
            .extend_ttl(&key, HISTORY_TTL_LEDGERS, HISTORY_TTL_LEDGERS);
        env.storage()
            .instance()
            .set(&StorageKey::EventCount, &index.saturating_add(1));
    }

    fn load_event_count(env: &Env) -> u32 {
        env.storage()
            .instance()
            .get(&StorageKey::EventCount)
            .unwrap_or(0)
    }

    fn load_config(env: &Env) -> Result<ButtonConfig, ButtonError> {
        env.storage()
            .instance()
            .get(&StorageKey::Config)
            .ok_or(ButtonError::NotInitialized)
    }

    fn load_state(env: &Env) -> Result<ButtonState, ButtonError> {
        env.storage()
            .instance()
            .get(&StorageKey::State)
            .ok_or(ButtonError::NotInitialized)
    }

    fn write_state(env: &Env, state: &ButtonState) {
        env.storage().instance().set(&StorageKey::State, state);
        // Keep config, state and the event counter alive together
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_TTL_LEDGERS, INSTANCE_TTL_LEDGERS);
    }
}
