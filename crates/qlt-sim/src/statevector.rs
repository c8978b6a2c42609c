//! Statevector simulation engine.

use num_complex::Complex64;
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use std::f64::consts::{FRAC_1_SQRT_2, PI};

use qlt_ir::{Circuit, Instruction, StandardGate};

use crate::error::{SimError, SimResult};

/// Largest register [`Statevector`] will allocate.
pub const MAX_QUBITS: usize = 26;

/// A statevector representing a quantum state.
#[derive(Debug, Clone, PartialEq)]
pub struct Statevector {
    /// The state amplitudes (2^n complex numbers).
    amplitudes: Vec<Complex64>,
    /// Number of qubits.
    num_qubits: usize,
}

impl Statevector {
    /// Create a new statevector initialized to |0...0⟩.
    pub fn new(num_qubits: usize) -> SimResult<Self> {
        Self::basis_state(num_qubits, 0)
    }

    /// Create the computational basis state `|index⟩`.
    pub fn basis_state(num_qubits: usize, index: usize) -> SimResult<Self> {
        if num_qubits > MAX_QUBITS {
            return Err(SimError::TooManyQubits {
                requested: num_qubits,
                max: MAX_QUBITS,
            });
        }
        let size = 1 << num_qubits;
        if index >= size {
            return Err(SimError::DimensionMismatch {
                expected: size,
                got: index + 1,
            });
        }
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); size];
        amplitudes[index] = Complex64::new(1.0, 0.0);
        Ok(Self {
            amplitudes,
            num_qubits,
        })
    }

    /// Wrap raw amplitudes. The length must be a power of two.
    pub fn from_amplitudes(amplitudes: Vec<Complex64>) -> SimResult<Self> {
        let len = amplitudes.len();
        if !len.is_power_of_two() {
            return Err(SimError::DimensionMismatch {
                expected: len.next_power_of_two(),
                got: len,
            });
        }
        Ok(Self {
            num_qubits: len.trailing_zeros() as usize,
            amplitudes,
        })
    }

    /// Simulate a bound circuit starting from `|0...0⟩`.
    pub fn from_circuit(circuit: &Circuit) -> SimResult<Self> {
        let mut state = Self::new(circuit.num_qubits())?;
        state.run(circuit)?;
        Ok(state)
    }

    /// Bind `parameters` into `circuit` and simulate it.
    pub fn from_parameterized(circuit: &Circuit, parameters: &[f64]) -> SimResult<Self> {
        Self::from_circuit(&circuit.bind(parameters)?)
    }

    /// Apply every instruction of a bound circuit.
    pub fn run(&mut self, circuit: &Circuit) -> SimResult<()> {
        if circuit.num_qubits() > self.num_qubits {
            return Err(SimError::QubitOutOfRange {
                required: circuit.num_qubits(),
                available: self.num_qubits,
            });
        }
        for instruction in circuit.instructions() {
            self.apply(instruction)?;
        }
        Ok(())
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// The amplitudes, indexed by basis state.
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// Consume the state, returning its amplitudes.
    pub fn into_amplitudes(self) -> Vec<Complex64> {
        self.amplitudes
    }

    /// Squared norm of the state.
    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.iter().map(Complex64::norm_sqr).sum()
    }

    /// Measurement probabilities of every basis state.
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(Complex64::norm_sqr).collect()
    }

    /// Draw `shots` measurements and return the count per basis state.
    pub fn sample_counts<R: Rng + ?Sized>(&self, shots: usize, rng: &mut R) -> SimResult<Vec<u64>> {
        let weights = self.probabilities();
        let dist = WeightedIndex::new(&weights).map_err(|_| SimError::ZeroNorm)?;
        let mut counts = vec![0u64; weights.len()];
        for _ in 0..shots {
            counts[dist.sample(rng)] += 1;
        }
        Ok(counts)
    }

    /// Estimate the measurement distribution from `shots` samples.
    pub fn sampled_probabilities<R: Rng + ?Sized>(
        &self,
        shots: usize,
        rng: &mut R,
    ) -> SimResult<Vec<f64>> {
        let counts = self.sample_counts(shots, rng)?;
        let total = shots.max(1) as f64;
        Ok(counts.into_iter().map(|c| c as f64 / total).collect())
    }

    /// Convert measurement outcome to bitstring, qubit 0 first.
    pub fn outcome_to_bitstring(&self, outcome: usize) -> String {
        format!("{:0width$b}", outcome, width = self.num_qubits)
            .chars()
            .rev()
            .collect()
    }

    /// Apply an instruction to the statevector.
    pub fn apply(&mut self, instruction: &Instruction) -> SimResult<()> {
        let qubits: Vec<usize> = instruction.qubits.iter().map(|q| q.index()).collect();
        if let Some(&max) = qubits.iter().max() {
            if max >= self.num_qubits {
                return Err(SimError::QubitOutOfRange {
                    required: max + 1,
                    available: self.num_qubits,
                });
            }
        }
        self.apply_standard_gate(&instruction.gate, &qubits)
    }

    /// Apply a standard gate.
    fn apply_standard_gate(&mut self, gate: &StandardGate, qubits: &[usize]) -> SimResult<()> {
        let angle = || {
            gate.parameter()
                .and_then(|p| p.as_f64())
                .ok_or_else(|| SimError::UnboundGate(gate.to_string()))
        };

        match gate {
            StandardGate::H => self.apply_h(qubits[0]),
            StandardGate::X => self.apply_x(qubits[0]),
            StandardGate::Rx(_) => self.apply_rx(qubits[0], angle()?),
            StandardGate::Ry(_) => self.apply_ry(qubits[0], angle()?),
            StandardGate::Rz(_) => self.apply_rz(qubits[0], angle()?),
            StandardGate::CX => self.apply_cx(qubits[0], qubits[1]),
            StandardGate::CZ => self.apply_cz(qubits[0], qubits[1]),
            StandardGate::XXPow(_) => {
                // XX^t = P₊ + e^{iπt} P₋
                let phase = Complex64::from_polar(1.0, PI * angle()?);
                let one = Complex64::new(1.0, 0.0);
                self.apply_xx_mix(qubits[0], qubits[1], (one + phase) / 2.0, (one - phase) / 2.0);
            }
            StandardGate::Rxx(_) => {
                let half = angle()? / 2.0;
                self.apply_xx_mix(
                    qubits[0],
                    qubits[1],
                    Complex64::new(half.cos(), 0.0),
                    Complex64::new(0.0, -half.sin()),
                );
            }
        }
        Ok(())
    }

    // =========================================================================
    // Single-qubit gate implementations
    // =========================================================================

    fn apply_x(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        for i in 0..self.amplitudes.len() {
            if i & mask == 0 {
                self.amplitudes.swap(i, i | mask);
            }
        }
    }

    fn apply_h(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        for i in 0..self.amplitudes.len() {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = FRAC_1_SQRT_2 * (a + b);
                self.amplitudes[j] = FRAC_1_SQRT_2 * (a - b);
            }
        }
    }

    fn apply_rx(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let c = (theta / 2.0).cos();
        let neg_i_s = Complex64::new(0.0, -(theta / 2.0).sin());
        for i in 0..self.amplitudes.len() {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = c * a + neg_i_s * b;
                self.amplitudes[j] = neg_i_s * a + c * b;
            }
        }
    }

    fn apply_ry(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        for i in 0..self.amplitudes.len() {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = c * a - s * b;
                self.amplitudes[j] = s * a + c * b;
            }
        }
    }

    fn apply_rz(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let phase_0 = Complex64::from_polar(1.0, -theta / 2.0);
        let phase_1 = Complex64::from_polar(1.0, theta / 2.0);
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if i & mask == 0 {
                *amp *= phase_0;
            } else {
                *amp *= phase_1;
            }
        }
    }

    // =========================================================================
    // Two-qubit gate implementations
    // =========================================================================

    fn apply_cx(&mut self, control: usize, target: usize) {
        let ctrl_mask = 1 << control;
        let tgt_mask = 1 << target;
        for i in 0..self.amplitudes.len() {
            if (i & ctrl_mask != 0) && (i & tgt_mask == 0) {
                self.amplitudes.swap(i, i | tgt_mask);
            }
        }
    }

    fn apply_cz(&mut self, q1: usize, q2: usize) {
        let both = (1 << q1) | (1 << q2);
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if i & both == both {
                *amp = -*amp;
            }
        }
    }

    /// Apply `diag · I + off · X⊗X` on the pair `(q1, q2)`.
    fn apply_xx_mix(&mut self, q1: usize, q2: usize, diag: Complex64, off: Complex64) {
        let m1 = 1 << q1;
        let flip = m1 | (1 << q2);
        for i in 0..self.amplitudes.len() {
            if i & m1 == 0 {
                let j = i ^ flip;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = diag * a + off * b;
                self.amplitudes[j] = off * a + diag * b;
            }
        }
    }
}
