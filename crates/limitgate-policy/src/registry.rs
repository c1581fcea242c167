//! The ordered, immutable set of configured limit rules.
//!
//! Registry order only affects which violation is reported first. Every rule
//! is validated once, at construction; an invalid rule is a fatal
//! [`ConfigError`].

use limitgate_core::config::LimitsConfig;
use limitgate_core::error::ConfigError;
use limitgate_core::types::{AdminTier, Transfer, TransferSubtype, TransferType};
use rust_decimal::Decimal;

use crate::filter::Refinement;
use crate::limit::{LimitKind, LimitRule, Selector};
use crate::predicates::Eligibility;

/// Name shared by the stacked group-account rules.
pub const GROUP_ACCOUNT_LIMIT: &str = "GE Liquid Token - Group Account User";

/// Name of the liquid-token cash-out block for standard users.
pub const STANDARD_USER_LIMIT: &str = "GE Liquid Token - Standard User";

/// Immutable rule collection shared by evaluators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitRegistry {
    rules: Vec<LimitRule>,
    admin_floor: AdminTier,
}

impl LimitRegistry {
    /// Validates and wraps `rules`, with the admin floor at `Sempoadmin`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a rule has an empty name or
    /// selector list, a subtype selector on a non-payment type, a zero
    /// window or count, a fraction outside `(0, 1]`, or a negative amount.
    pub fn new(rules: Vec<LimitRule>) -> Result<Self, ConfigError> {
        for (index, rule) in rules.iter().enumerate() {
            validate_rule(index, rule)?;
        }
        Ok(Self {
            rules,
            admin_floor: AdminTier::Sempoadmin,
        })
    }

    /// Sets the lowest admin tier whose involvement exempts a transfer.
    #[must_use]
    pub const fn with_admin_floor(mut self, admin_floor: AdminTier) -> Self {
        self.admin_floor = admin_floor;
        self
    }

    /// Builds the reference tiered policy from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] if a threshold key is absent,
    /// or [`ConfigError::InvalidValue`] if a parameter is out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// use limitgate_core::config::LimitsConfig;
    /// use limitgate_policy::registry::LimitRegistry;
    ///
    /// let registry = LimitRegistry::from_config(&LimitsConfig::default()).unwrap();
    /// assert_eq!(registry.len(), 19);
    /// assert_eq!(registry.rules()[0].name(), "Sempo Level 0: P7");
    /// ```
    pub fn from_config(config: &LimitsConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let general_payments = vec![
            Selector::payment(TransferSubtype::Standard),
            Selector::payment(TransferSubtype::AgentOut),
            Selector::payment(TransferSubtype::AgentIn),
            Selector::payment(TransferSubtype::Reclamation),
        ];
        let cash_in_out = vec![
            Selector::of_type(TransferType::Withdrawal),
            Selector::of_type(TransferType::Deposit),
        ];
        let liquid_cash_out = vec![
            Selector::payment(TransferSubtype::AgentOut),
            Selector::of_type(TransferType::Withdrawal),
        ];

        let total = |key: &str, window_days: u32| -> Result<LimitKind, ConfigError> {
            Ok(LimitKind::TotalAmount {
                total: config.scaled_threshold(key)?,
                window_days,
                refinement: Refinement::MatchingTransferType,
            })
        };

        let mut rules = Vec::new();

        for (level, eligibility) in [
            (0, Eligibility::UnverifiedAnyToken),
            (1, Eligibility::PhoneVerifiedAnyToken),
        ] {
            rules.push(LimitRule::new(
                format!("Sempo Level {level}: P7"),
                general_payments.clone(),
                eligibility,
                total(&format!("{level}.P7"), 7)?,
            ));
            rules.push(LimitRule::new(
                format!("Sempo Level {level}: P30"),
                general_payments.clone(),
                eligibility,
                total(&format!("{level}.P30"), 30)?,
            ));
            rules.push(LimitRule::new(
                format!("Sempo Level {level}: WD30"),
                cash_in_out.clone(),
                eligibility,
                LimitKind::NoTransferAllowed,
            ));
        }

        for (level, eligibility) in [
            (2, Eligibility::KycVerifiedAnyToken),
            (3, Eligibility::BusinessVerifiedAnyToken),
        ] {
            for (suffix, selectors, window_days) in [
                ("P7", &general_payments, 7),
                ("P30", &general_payments, 30),
                ("WD7", &cash_in_out, 7),
                ("WD30", &cash_in_out, 30),
            ] {
                rules.push(LimitRule::new(
                    format!("Sempo Level {level}: {suffix}"),
                    selectors.clone(),
                    eligibility,
                    total(&format!("{level}.{suffix}"), window_days)?,
                ));
            }
        }

        rules.push(LimitRule::new(
            STANDARD_USER_LIMIT,
            liquid_cash_out.clone(),
            Eligibility::StandardUserLiquidToken,
            LimitKind::NoTransferAllowed,
        ));

        let window_days = config.group_window_days;
        let refinement = Refinement::WithdrawalOrAgentOutNotExcluded;
        for kind in [
            LimitKind::TransferCount {
                count: config.group_transfer_count,
                window_days,
                refinement,
            },
            LimitKind::BalanceFraction {
                fraction: config.group_balance_fraction,
                window_days,
                refinement,
            },
            LimitKind::MinimumSent {
                window_days,
                refinement,
                reference: Refinement::StandardSubtype,
            },
            LimitKind::MaxPerTransfer {
                maximum: config.scaled_threshold("LT.MaxAm")?,
            },
        ] {
            rules.push(LimitRule::new(
                GROUP_ACCOUNT_LIMIT,
                liquid_cash_out.clone(),
                Eligibility::GroupAccountLiquidToken,
                kind,
            ));
        }

        Ok(Self::new(rules)?.with_admin_floor(config.admin_floor))
    }

    /// Returns every rule in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[LimitRule] {
        &self.rules
    }

    /// Returns the number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the admin exemption floor.
    #[must_use]
    pub const fn admin_floor(&self) -> AdminTier {
        self.admin_floor
    }

    /// Returns the rules that apply to `transfer`, in declaration order.
    #[must_use]
    pub fn applicable(&self, transfer: &Transfer) -> Vec<&LimitRule> {
        self.rules
            .iter()
            .filter(|rule| rule.applies_to(transfer, self.admin_floor))
            .collect()
    }
}

fn validate_rule(index: usize, rule: &LimitRule) -> Result<(), ConfigError> {
    let field = |name: &str| format!("rules[{index}].{name}");

    if rule.name().trim().is_empty() {
        return Err(ConfigError::invalid_value(field("name"), "<empty>"));
    }

    if rule.selectors().is_empty() {
        return Err(ConfigError::invalid_value(field("selectors"), "<empty>"));
    }

    for selector in rule.selectors() {
        if let Selector::TypeAndSubtype { transfer_type, .. } = selector {
            if *transfer_type != TransferType::Payment {
                return Err(ConfigError::invalid_value(
                    field("selectors"),
                    selector.to_string(),
                ));
            }
        }
    }

    match rule.kind() {
        LimitKind::NoTransferAllowed => {}
        LimitKind::MaxPerTransfer { maximum } => {
            if *maximum < 0 {
                return Err(ConfigError::invalid_value(field("maximum"), maximum.to_string()));
            }
        }
        LimitKind::TotalAmount {
            total, window_days, ..
        } => {
            if *total < 0 {
                return Err(ConfigError::invalid_value(field("total"), total.to_string()));
            }
            check_window(&field, *window_days)?;
        }
        LimitKind::MinimumSent { window_days, .. } => check_window(&field, *window_days)?,
        LimitKind::BalanceFraction {
            fraction,
            window_days,
            ..
        } => {
            if *fraction <= Decimal::ZERO || *fraction > Decimal::ONE {
                return Err(ConfigError::invalid_value(field("fraction"), fraction.to_string()));
            }
            check_window(&field, *window_days)?;
        }
        LimitKind::TransferCount {
            count, window_days, ..
        } => {
            if *count == 0 {
                return Err(ConfigError::invalid_value(field("count"), "0"));
            }
            check_window(&field, *window_days)?;
        }
    }

    Ok(())
}

fn check_window(field: &impl Fn(&str) -> String, window_days: u32) -> Result<(), ConfigError> {
    if window_days == 0 {
        return Err(ConfigError::invalid_value(field("window_days"), "0"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

    use super::*;
    use limitgate_core::config::ConfigBuilder;
    use limitgate_core::types::{KycApplication, KycType, Token, TokenType, User};

    fn registry() -> LimitRegistry {
        LimitRegistry::from_config(&LimitsConfig::default()).unwrap()
    }

    fn names<'a>(rules: &[&'a LimitRule]) -> Vec<&'a str> {
        rules.iter().map(|r| r.name()).collect()
    }

    fn payment_from(user: User, token_type: TokenType) -> Transfer {
        Transfer {
            id: 1,
            amount: 10,
            token: Some(Token::new("GE", token_type)),
            sender: Some(user),
            ..Default::default()
        }
    }

    // =========================================================================
    // Construction
    // =========================================================================

    #[test]
    fn test_reference_policy_shape() {
        let registry = registry();
        assert_eq!(registry.len(), 19);
        assert_eq!(registry.admin_floor(), AdminTier::Sempoadmin);

        let group: Vec<_> = registry
            .rules()
            .iter()
            .filter(|r| r.name() == GROUP_ACCOUNT_LIMIT)
            .map(|r| r.kind().as_str())
            .collect();
        assert_eq!(
            group,
            vec![
                "transfer_count",
                "balance_fraction",
                "minimum_sent",
                "max_per_transfer"
            ]
        );
    }

    #[test]
    fn test_thresholds_are_scaled() {
        let config = ConfigBuilder::new()
            .exchange_rate(Decimal::new(25, 1))
            .threshold("LT.MaxAm", 101)
            .build();
        let registry = LimitRegistry::from_config(&config.limits).unwrap();

        let max = registry
            .rules()
            .iter()
            .find_map(|r| match r.kind() {
                LimitKind::MaxPerTransfer { maximum } => Some(*maximum),
                _ => None,
            })
            .unwrap();
        assert_eq!(max, 252);
    }

    #[test]
    fn test_missing_threshold_is_fatal() {
        let mut limits = LimitsConfig::default();
        limits.thresholds.remove("3.WD7");
        let err = LimitRegistry::from_config(&limits).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { .. }));
    }

    #[test]
    fn test_invalid_rules_are_rejected() {
        let payment = vec![Selector::of_type(TransferType::Payment)];
        let bad = [
            LimitRule::new("", payment.clone(), Eligibility::AnyUserAnyToken, LimitKind::NoTransferAllowed),
            LimitRule::new("x", vec![], Eligibility::AnyUserAnyToken, LimitKind::NoTransferAllowed),
            LimitRule::new(
                "x",
                vec![Selector::TypeAndSubtype {
                    transfer_type: TransferType::Withdrawal,
                    transfer_subtype: TransferSubtype::AgentOut,
                }],
                Eligibility::AnyUserAnyToken,
                LimitKind::NoTransferAllowed,
            ),
            LimitRule::new(
                "x",
                payment.clone(),
                Eligibility::AnyUserAnyToken,
                LimitKind::MaxPerTransfer { maximum: -1 },
            ),
            LimitRule::new(
                "x",
                payment.clone(),
                Eligibility::AnyUserAnyToken,
                LimitKind::TotalAmount {
                    total: 10,
                    window_days: 0,
                    refinement: Refinement::MatchingTransferType,
                },
            ),
            LimitRule::new(
                "x",
                payment.clone(),
                Eligibility::AnyUserAnyToken,
                LimitKind::BalanceFraction {
                    fraction: Decimal::new(11, 1),
                    window_days: 30,
                    refinement: Refinement::MatchingTransferType,
                },
            ),
            LimitRule::new(
                "x",
                payment,
                Eligibility::AnyUserAnyToken,
                LimitKind::TransferCount {
                    count: 0,
                    window_days: 30,
                    refinement: Refinement::MatchingTransferType,
                },
            ),
        ];

        for rule in bad {
            let display = rule.to_string();
            assert!(
                matches!(
                    LimitRegistry::new(vec![rule]),
                    Err(ConfigError::InvalidValue { .. })
                ),
                "{display}"
            );
        }
    }

    // =========================================================================
    // Applicability
    // =========================================================================

    #[test]
    fn test_unverified_payment_gets_level_zero() {
        let transfer = payment_from(User::new(1), TokenType::Reserve);
        assert_eq!(
            names(&registry().applicable(&transfer)),
            vec!["Sempo Level 0: P7", "Sempo Level 0: P30"]
        );
    }

    #[test]
    fn test_tier_escalation_switches_payment_limits() {
        let registry = registry();
        let phone = User::new(1).with_phone_verified(true);
        let transfer = payment_from(phone.clone(), TokenType::Reserve);
        assert_eq!(
            names(&registry.applicable(&transfer)),
            vec!["Sempo Level 1: P7", "Sempo Level 1: P30"]
        );

        let kyc = phone.with_kyc(KycApplication::verified(KycType::Individual));
        let transfer = payment_from(kyc, TokenType::Reserve);
        assert_eq!(
            names(&registry.applicable(&transfer)),
            vec!["Sempo Level 2: P7", "Sempo Level 2: P30"]
        );
    }

    #[test]
    fn test_standard_liquid_withdrawal_is_blocked_rule() {
        let mut transfer = payment_from(
            User::new(1).with_kyc(KycApplication::verified(KycType::Business)),
            TokenType::Liquid,
        );
        transfer.transfer_type = TransferType::Withdrawal;
        transfer.transfer_subtype = None;

        assert_eq!(
            names(&registry().applicable(&transfer)),
            vec!["Sempo Level 3: WD7", "Sempo Level 3: WD30", STANDARD_USER_LIMIT]
        );
    }

    #[test]
    fn test_group_agent_out_gets_stacked_rules() {
        let mut transfer = payment_from(
            User::new(1)
                .with_phone_verified(true)
                .with_group_account_role(true),
            TokenType::Liquid,
        );
        transfer.transfer_subtype = Some(TransferSubtype::AgentOut);

        let registry = registry();
        let applicable = registry.applicable(&transfer);
        assert_eq!(applicable.len(), 6);
        assert_eq!(applicable[0].name(), "Sempo Level 1: P7");
        assert!(applicable[2..].iter().all(|r| r.name() == GROUP_ACCOUNT_LIMIT));
    }

    #[test]
    fn test_admin_involved_gets_nothing() {
        let mut transfer = payment_from(User::new(1), TokenType::Liquid);
        transfer.recipient = Some(User::new(2).with_admin_tier(AdminTier::Sempoadmin));
        assert!(registry().applicable(&transfer).is_empty());

        let registry = registry().with_admin_floor(AdminTier::Admin);
        transfer.recipient = Some(User::new(2).with_admin_tier(AdminTier::Admin));
        assert!(registry.applicable(&transfer).is_empty());
    }

    #[test]
    fn test_applicable_is_idempotent() {
        let registry = registry();
        let transfer = payment_from(User::new(1), TokenType::Reserve);
        assert_eq!(registry.applicable(&transfer), registry.applicable(&transfer));
    }
}
