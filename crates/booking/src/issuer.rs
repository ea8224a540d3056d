use inventory_store::{Booking, Ticket};

/// Length in characters of a redemption token.
pub const TOKEN_LENGTH: usize = 21;

/// URL-safe token alphabet: 64 symbols, so each random byte maps to one
/// symbol by masking its low 6 bits.
const TOKEN_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Source of unique ticket tokens.
///
/// The production implementation draws from thread-local entropy; tests
/// substitute a deterministic one.
pub trait TokenGenerator: Send + Sync {
    /// Returns a fresh token, distinct from previously generated ones up
    /// to negligible collision probability.
    fn generate(&self) -> String;
}

/// Generates random 21-character tokens over a URL-safe alphabet.
///
/// 21 characters of 6 bits each carry 126 bits of entropy, so no token
/// registry is needed to keep tokens distinct at any plausible issuance
/// volume.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTokenGenerator;

impl TokenGenerator for RandomTokenGenerator {
    fn generate(&self) -> String {
        use rand::RngCore;

        let mut bytes = [0u8; TOKEN_LENGTH];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes
            .iter()
            .map(|b| TOKEN_ALPHABET[(b & 0x3f) as usize] as char)
            .collect()
    }
}

/// Builds the ticket records for a booking, one per purchased seat.
///
/// Issuance is pure generation: the tickets only become real when the
/// reservation engine commits them atomically with the tier decrement.
pub struct TicketIssuer<G> {
    generator: G,
}

impl<G: TokenGenerator> TicketIssuer<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    /// Creates exactly `booking.quantity` tickets for the booking, each
    /// with its own redemption token.
    pub fn issue(&self, booking: &Booking) -> Vec<Ticket> {
        (0..booking.quantity)
            .map(|_| Ticket::new(self.generator.generate(), booking))
            .collect()
    }
}
