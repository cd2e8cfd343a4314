//! Single-asset long/flat position.
//!
//! Long: cash == 0, shares > 0. Flat: shares == 0, cash >= 0.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionState {
    Flat,
    Long,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub state: PositionState,
    pub cash: f64,
    pub shares: f64,
}

impl Position {
    pub fn new(cash: f64) -> Self {
        Position {
            state: PositionState::Flat,
            cash,
            shares: 0.0,
        }
    }

    pub fn is_long(&self) -> bool {
        self.state == PositionState::Long
    }

    pub fn is_flat(&self) -> bool {
        self.state == PositionState::Flat
    }

    /// cash + shares * price
    pub fn market_value(&self, price: f64) -> f64 {
        self.cash + self.shares * price
    }

    /// Convert all cash to shares. No-op unless flat.
    pub fn buy_all(&mut self, price: f64) {
        if !self.is_flat() {
            return;
        }
        self.shares = self.cash / price;
        self.cash = 0.0;
        self.state = PositionState::Long;
    }

    /// Convert all shares to cash. No-op unless long.
    pub fn sell_all(&mut self, price: f64) {
        if !self.is_long() {
            return;
        }
        self.cash = self.shares * price;
        self.shares = 0.0;
        self.state = PositionState::Flat;
    }
}
