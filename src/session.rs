//! Checkout conversation state, held per user in a swappable session store.
//!
//! The state machine is strictly forward-moving:
//! `None -> AwaitingName -> AwaitingPhone -> AwaitingAddress ->
//! AwaitingPayment -> (order created, state cleared)`.
//!
//! Storage goes through [`ErasedStorage`], so the in-memory default can be
//! swapped for a distributed or persisted backing without touching any of
//! the transition logic below.

use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, ErasedStorage};

use crate::errors::ShopError;

/// Session storage handle injected at dispatcher setup.
pub type SessionStorage = ErasedStorage<SessionState>;

/// Per-chat dialogue over the session store.
pub type CheckoutDialogue = Dialogue<SessionState, SessionStorage>;

/// The current step of the checkout conversation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckoutStage {
    #[default]
    None,
    AwaitingName,
    AwaitingPhone,
    AwaitingAddress,
    AwaitingPayment,
}

/// Delivery details accumulated across checkout stages.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Transient per-user conversation state. Held only by the session store;
/// a restart discards it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Language picked via the language menu, if any
    pub lang: Option<String>,
    pub stage: CheckoutStage,
    pub draft: OrderDraft,
}

impl SessionState {
    pub fn with_lang(lang: impl Into<String>) -> Self {
        SessionState {
            lang: Some(lang.into()),
            ..SessionState::default()
        }
    }

    /// The session language, or the system default when none was picked.
    pub fn lang_or<'a>(&'a self, default_lang: &'a str) -> &'a str {
        self.lang.as_deref().unwrap_or(default_lang)
    }

    /// `None -> AwaitingName`, guarded on a non-empty cart. Pressing
    /// checkout mid-conversation keeps the current position rather than
    /// restarting the flow.
    pub fn begin_checkout(&self, cart_len: usize) -> Result<SessionState, ShopError> {
        if cart_len == 0 {
            return Err(ShopError::EmptyCart);
        }
        if self.stage != CheckoutStage::None {
            return Ok(self.clone());
        }
        Ok(SessionState {
            lang: self.lang.clone(),
            stage: CheckoutStage::AwaitingName,
            draft: OrderDraft::default(),
        })
    }

    /// Free text during `AwaitingName` becomes the draft name, verbatim.
    /// Returns `None` when the event is not owned by the current stage.
    pub fn submit_name(&self, text: &str) -> Option<SessionState> {
        if self.stage != CheckoutStage::AwaitingName {
            return None;
        }
        Some(SessionState {
            lang: self.lang.clone(),
            stage: CheckoutStage::AwaitingPhone,
            draft: OrderDraft {
                name: Some(text.to_string()),
                ..self.draft.clone()
            },
        })
    }

    /// Only a contact-share event advances `AwaitingPhone`; free text in
    /// that stage is ignored by the caller.
    pub fn submit_contact(&self, phone_number: &str) -> Option<SessionState> {
        if self.stage != CheckoutStage::AwaitingPhone {
            return None;
        }
        Some(SessionState {
            lang: self.lang.clone(),
            stage: CheckoutStage::AwaitingAddress,
            draft: OrderDraft {
                phone: Some(phone_number.to_string()),
                ..self.draft.clone()
            },
        })
    }

    /// Free text during `AwaitingAddress` becomes the draft address.
    pub fn submit_address(&self, text: &str) -> Option<SessionState> {
        if self.stage != CheckoutStage::AwaitingAddress {
            return None;
        }
        Some(SessionState {
            lang: self.lang.clone(),
            stage: CheckoutStage::AwaitingPayment,
            draft: OrderDraft {
                address: Some(text.to_string()),
                ..self.draft.clone()
            },
        })
    }

    /// Terminal guard: payment may only complete a conversation that
    /// reached `AwaitingPayment` with a non-empty name and address.
    pub fn ready_for_payment(&self) -> Result<(), ShopError> {
        let name_ok = self.draft.name.as_deref().is_some_and(|n| !n.is_empty());
        let address_ok = self
            .draft
            .address
            .as_deref()
            .is_some_and(|a| !a.is_empty());
        if self.stage == CheckoutStage::AwaitingPayment && name_ok && address_ok {
            Ok(())
        } else {
            Err(ShopError::CheckoutNotStarted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_idle() {
        let state = SessionState::default();
        assert_eq!(state.stage, CheckoutStage::None);
        assert_eq!(state.draft, OrderDraft::default());
        assert_eq!(state.lang_or("uz"), "uz");
    }

    #[test]
    fn test_begin_checkout_requires_cart_lines() {
        let state = SessionState::default();
        assert_eq!(state.begin_checkout(0), Err(ShopError::EmptyCart));
        // Failed guard leaves the caller's state untouched
        assert_eq!(state.stage, CheckoutStage::None);

        let started = state.begin_checkout(2).unwrap();
        assert_eq!(started.stage, CheckoutStage::AwaitingName);
    }

    #[test]
    fn test_full_forward_walk() {
        let state = SessionState::with_lang("en").begin_checkout(1).unwrap();
        let state = state.submit_name("Aziz").unwrap();
        assert_eq!(state.stage, CheckoutStage::AwaitingPhone);

        let state = state.submit_contact("+998901234567").unwrap();
        assert_eq!(state.stage, CheckoutStage::AwaitingAddress);

        let state = state.submit_address("Tashkent, St. 1").unwrap();
        assert_eq!(state.stage, CheckoutStage::AwaitingPayment);
        assert!(state.ready_for_payment().is_ok());
        assert_eq!(state.draft.name.as_deref(), Some("Aziz"));
        assert_eq!(state.draft.phone.as_deref(), Some("+998901234567"));
        assert_eq!(state.lang.as_deref(), Some("en"));
    }

    #[test]
    fn test_stages_reject_events_they_do_not_own() {
        let idle = SessionState::default();
        assert_eq!(idle.submit_name("x"), None);
        assert_eq!(idle.submit_contact("+1"), None);
        assert_eq!(idle.submit_address("x"), None);

        let at_payment = SessionState {
            stage: CheckoutStage::AwaitingPayment,
            ..SessionState::default()
        };
        // No event moves AwaitingPayment backwards
        assert_eq!(at_payment.submit_name("again"), None);
        assert_eq!(at_payment.submit_contact("+1"), None);
        assert_eq!(at_payment.submit_address("x"), None);
    }

    #[test]
    fn test_free_text_does_not_advance_phone_stage() {
        let state = SessionState::default()
            .begin_checkout(1)
            .unwrap()
            .submit_name("Aziz")
            .unwrap();

        // Only submit_contact owns this stage; a text submission is not
        // an address submission.
        assert_eq!(state.submit_address("typed a phone number"), None);
        assert_eq!(state.stage, CheckoutStage::AwaitingPhone);
    }

    #[test]
    fn test_checkout_mid_flow_keeps_position() {
        let state = SessionState::default()
            .begin_checkout(1)
            .unwrap()
            .submit_name("Aziz")
            .unwrap();

        let again = state.begin_checkout(1).unwrap();
        assert_eq!(again, state);
    }

    #[test]
    fn test_payment_guard_needs_complete_draft() {
        let incomplete = SessionState {
            stage: CheckoutStage::AwaitingPayment,
            draft: OrderDraft {
                name: Some(String::new()),
                phone: None,
                address: Some("Tashkent".to_string()),
            },
            lang: None,
        };
        assert_eq!(
            incomplete.ready_for_payment(),
            Err(ShopError::CheckoutNotStarted)
        );

        // Phone stays optional: contact share is its only writer
        let no_phone = SessionState {
            stage: CheckoutStage::AwaitingPayment,
            draft: OrderDraft {
                name: Some("Aziz".to_string()),
                phone: None,
                address: Some("Tashkent".to_string()),
            },
            lang: None,
        };
        assert!(no_phone.ready_for_payment().is_ok());
    }
}
