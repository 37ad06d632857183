//! Fila circular limitada de tokens de comando.
//!
//! ```text
//!   tail → [ t0 ][ t1 ][ t2 ][    ][    ] ← head
//! ```
//!
//! Um slot fica sempre vago para distinguir cheio de vazio pela comparação
//! `head`/`tail`, então a ocupação máxima é `capacity - 1`.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Capacidade da fila de comandos (9 tokens utilizáveis).
pub const QUEUE_CAPACITY: usize = 10;

struct Ring {
    slots: Vec<Option<String>>,
    head: usize,
    tail: usize,
    /// Alguma inserção foi rejeitada desde o último `drain`.
    full: bool,
    dropped: u64,
}

impl Ring {
    fn len(&self) -> usize {
        let cap = self.slots.len();
        (self.head + cap - self.tail) % cap
    }
}

/// Fila FIFO protegida por um único lock.
pub struct CommandQueue {
    inner: Mutex<Ring>,
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::with_capacity(QUEUE_CAPACITY)
    }
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cria uma fila com `capacity` slots (`capacity - 1` utilizáveis).
    ///
    /// # Panics
    /// Se `capacity < 2`.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity >= 2, "fila precisa de pelo menos 2 slots");
        Self {
            inner: Mutex::new(Ring {
                slots: vec![None; capacity],
                head: 0,
                tail: 0,
                full: false,
                dropped: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Ring> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enfileira um token. Se a fila está cheia o token é descartado,
    /// a condição de cheio é registrada e retorna `false`.
    pub fn try_enqueue(&self, token: impl Into<String>) -> bool {
        let mut ring = self.lock();
        let cap = ring.slots.len();
        let next = (ring.head + 1) % cap;
        if next == ring.tail {
            ring.full = true;
            ring.dropped += 1;
            return false;
        }
        let head = ring.head;
        ring.slots[head] = Some(token.into());
        ring.head = next;
        true
    }

    /// Retira todos os tokens enfileirados neste instante, em ordem FIFO.
    ///
    /// Nunca bloqueia esperando tokens: com a fila vazia retorna um `Vec`
    /// vazio. O processamento dos tokens acontece fora do lock.
    pub fn drain(&self) -> Vec<String> {
        let mut ring = self.lock();
        let cap = ring.slots.len();
        let mut tokens = Vec::with_capacity(ring.len());
        while ring.tail != ring.head {
            let tail = ring.tail;
            if let Some(token) = ring.slots[tail].take() {
                tokens.push(token);
            }
            ring.tail = (tail + 1) % cap;
        }
        ring.full = false;
        tokens
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Número total de slots (incluindo o reservado).
    pub fn capacity(&self) -> usize {
        self.lock().slots.len()
    }

    /// `true` se algum token foi descartado desde o último [`drain`](Self::drain).
    pub fn was_full(&self) -> bool {
        self.lock().full
    }

    /// Total de tokens descartados desde a criação.
    pub fn dropped(&self) -> u64 {
        self.lock().dropped
    }
}
