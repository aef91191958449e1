//! Mock wallet shown on the payments screen. Nothing here talks to a gateway.

use chrono::NaiveDate;

pub const GATEWAY_PLACEHOLDER: &str = "xxxx-enter-gateway-api-here-xxxx";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaymentsTab {
    #[default]
    Wallet,
    Methods,
    History,
}

impl PaymentsTab {
    pub const ALL: [PaymentsTab; 3] = [
        PaymentsTab::Wallet,
        PaymentsTab::Methods,
        PaymentsTab::History,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Wallet => "Neobank Wallet",
            Self::Methods => "Payment Methods",
            Self::History => "Transaction History",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Wallet => Self::Methods,
            Self::Methods => Self::History,
            Self::History => Self::Wallet,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Card,
    BankAccount,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentMethod {
    pub kind: MethodKind,
    pub name: String,
    pub display: String,
}

impl PaymentMethod {
    pub fn icon(&self) -> &'static str {
        match self.kind {
            MethodKind::Card => "💳",
            MethodKind::BankAccount => "🏦",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// Positive when earned, negative when paid out.
    pub amount: f64,
    pub description: String,
    pub date: NaiveDate,
}

impl Transaction {
    pub fn is_earning(&self) -> bool {
        self.amount >= 0.0
    }

    pub fn amount_display(&self) -> String {
        let sign = if self.is_earning() { "+" } else { "" };
        format!("{sign}${:.2}", self.amount.abs())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Wallet {
    pub balance: f64,
    pub methods: Vec<PaymentMethod>,
    pub transactions: Vec<Transaction>,
}

impl Wallet {
    pub fn demo() -> Self {
        let transaction = |amount: f64, description: &str, day: u32| Transaction {
            amount,
            description: description.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap_or_default(),
        };
        Self {
            balance: 150.50,
            methods: vec![
                PaymentMethod {
                    kind: MethodKind::Card,
                    name: "Visa Card".to_string(),
                    display: "**** **** **** 1234".to_string(),
                },
                PaymentMethod {
                    kind: MethodKind::BankAccount,
                    name: "Chase Bank".to_string(),
                    display: "****5678".to_string(),
                },
            ],
            transactions: vec![
                transaction(75.00, "House cleaning task", 15),
                transaction(-25.00, "Delivery service", 14),
                transaction(120.00, "Tech support", 13),
            ],
        }
    }

    pub fn balance_display(&self) -> String {
        format!("${:.2}", self.balance)
    }
}
