use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::transport::traits::Transport;
use crate::{Error, Result};

/// Mock transport for unit tests. It records written frames and replays
/// queued replies for full-duplex exchanges.
#[derive(Debug, Default)]
pub struct MockTransport {
    /// Every frame passed to `write` or `exchange`, in order.
    pub sent: Vec<Vec<u8>>,
    /// Replies handed out by `exchange`, front first.
    pub replies: VecDeque<Vec<u8>>,
    /// Reset-line transitions observed via `set_reset`.
    pub reset_transitions: Vec<bool>,
    /// Level returned by `irq_level`.
    pub irq: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one exchange reply. Its length must match the frame the
    /// code under test will clock out.
    pub fn push_reply(&mut self, reply: Vec<u8>) {
        self.replies.push_back(reply);
    }

    /// Queue a register-read reply; register reads are two-byte frames
    /// with the value in byte 1.
    pub fn push_register_value(&mut self, value: u8) {
        self.push_reply(vec![0x00, value]);
    }

    pub fn pop_sent(&mut self) -> Option<Vec<u8>> {
        self.sent.pop()
    }
}

impl Transport for MockTransport {
    fn exchange(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        self.sent.push(tx.to_vec());
        let reply = self
            .replies
            .pop_front()
            .ok_or_else(|| Error::Transport("mock reply queue empty".into()))?;
        if reply.len() != rx.len() {
            return Err(Error::Transport(format!(
                "mock reply length {} != frame length {}",
                reply.len(),
                rx.len()
            )));
        }
        rx.copy_from_slice(&reply);
        Ok(())
    }

    fn write(&mut self, tx: &[u8]) -> Result<()> {
        self.sent.push(tx.to_vec());
        Ok(())
    }

    fn set_reset(&mut self, high: bool) -> Result<()> {
        self.reset_transitions.push(high);
        Ok(())
    }

    fn irq_level(&mut self) -> Result<bool> {
        Ok(self.irq)
    }
}

// A shared handle lets a test keep inspecting the mock after handing it
// to a device that takes ownership of its transport.
impl Transport for Rc<RefCell<MockTransport>> {
    fn exchange(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        self.borrow_mut().exchange(tx, rx)
    }

    fn write(&mut self, tx: &[u8]) -> Result<()> {
        self.borrow_mut().write(tx)
    }

    fn set_reset(&mut self, high: bool) -> Result<()> {
        self.borrow_mut().set_reset(high)
    }

    fn irq_level(&mut self) -> Result<bool> {
        self.borrow_mut().irq_level()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_writes_and_replays_exchanges() {
        let mut m = MockTransport::new();
        m.push_register_value(0x37);

        m.write(&[0x02, 0x80]).unwrap();
        let mut rx = [0u8; 2];
        m.exchange(&[0x84, 0x00], &mut rx).unwrap();

        assert_eq!(m.sent, vec![vec![0x02, 0x80], vec![0x84, 0x00]]);
        assert_eq!(rx[1], 0x37);
    }

    #[test]
    fn empty_queue_is_a_transport_error() {
        let mut m = MockTransport::new();
        let mut rx = [0u8; 2];
        assert!(matches!(
            m.exchange(&[0x84, 0x00], &mut rx),
            Err(Error::Transport(_))
        ));
    }

    #[test]
    fn mismatched_reply_length_is_rejected() {
        let mut m = MockTransport::new();
        m.push_reply(vec![0x01]);
        let mut rx = [0u8; 2];
        assert!(matches!(
            m.exchange(&[0x84, 0x00], &mut rx),
            Err(Error::Transport(_))
        ));
    }
}
