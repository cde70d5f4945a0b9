//! # Tokens and Trade Direction

use std::fmt;

/// Identifier of an account interacting with the pool
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "client", serde(transparent))]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One of the two fungible assets of the pair
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Token {
    A,
    B,
}

impl Token {
    /// The other token of the pair
    pub fn other(self) -> Token {
        match self {
            Token::A => Token::B,
            Token::B => Token::A,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::A => f.write_str("A"),
            Token::B => f.write_str("B"),
        }
    }
}

/// Direction of a trade, named by the token sold first
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    /// Sell token A for token B
    AToB,
    /// Sell token B for token A
    BToA,
}

impl Direction {
    /// Both directions, in order-pool order
    pub const ALL: [Direction; 2] = [Direction::AToB, Direction::BToA];

    /// Token paid into the pool
    pub fn sell_token(self) -> Token {
        match self {
            Direction::AToB => Token::A,
            Direction::BToA => Token::B,
        }
    }

    /// Token received from the pool
    pub fn buy_token(self) -> Token {
        self.sell_token().other()
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::AToB => Direction::BToA,
            Direction::BToA => Direction::AToB,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.sell_token(), self.buy_token())
    }
}
