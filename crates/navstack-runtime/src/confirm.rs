#![forbid(unsafe_code)]

//! Deferred confirmation result.
//!
//! [`ConfirmFuture`] and [`ConfirmResolver`] share one slot. The bridge keeps
//! the resolver keyed by overlay id and resolves it exactly once: with the
//! chosen value when a confirm button is activated, or with `false` when the
//! dialog is closed any other way.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use navstack_core::OverlayId;

#[derive(Debug, Default)]
struct Slot {
    value: Option<bool>,
    waker: Option<Waker>,
}

/// Future returned by [`crate::HistoryBridge::confirm`].
#[derive(Debug)]
#[must_use = "a confirmation result is only observable by polling the future"]
pub struct ConfirmFuture {
    overlay_id: OverlayId,
    slot: Rc<RefCell<Slot>>,
}

/// Resolving half of a [`ConfirmFuture`].
#[derive(Debug)]
pub(crate) struct ConfirmResolver {
    slot: Rc<RefCell<Slot>>,
}

pub(crate) fn pair(overlay_id: OverlayId) -> (ConfirmFuture, ConfirmResolver) {
    let slot = Rc::new(RefCell::new(Slot::default()));
    (
        ConfirmFuture {
            overlay_id,
            slot: Rc::clone(&slot),
        },
        ConfirmResolver { slot },
    )
}

impl ConfirmFuture {
    /// Id of the dialog overlay.
    #[must_use]
    pub fn overlay_id(&self) -> &OverlayId {
        &self.overlay_id
    }

    /// Result if already resolved, without polling.
    #[must_use]
    pub fn try_result(&self) -> Option<bool> {
        self.slot.borrow().value
    }
}

impl Future for ConfirmFuture {
    type Output = bool;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<bool> {
        let mut slot = self.slot.borrow_mut();
        match slot.value {
            Some(value) => Poll::Ready(value),
            None => {
                slot.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

impl ConfirmResolver {
    pub(crate) fn resolve(self, value: bool) {
        let waker = {
            let mut slot = self.slot.borrow_mut();
            slot.value = Some(value);
            slot.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}
