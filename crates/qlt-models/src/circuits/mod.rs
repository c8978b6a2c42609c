//! Ansatz circuit generators.

pub mod blocks;
pub mod compiling;
pub mod qcbm;
pub mod vqe;

pub use blocks::{xx_yy_zz_block, zz_block};
pub use compiling::{
    COMPILING_PARAMETER_PERIOD, compiling_num_parameters, compiling_overparameterized,
    compiling_target, compiling_target_circuit, trivial_parameters,
};
pub use qcbm::{qcbm_ansatz, qcbm_num_parameters};
pub use vqe::{
    j1j2_alternating_ansatz, j1j2_alternating_num_parameters, j1j2_full_ansatz,
    j1j2_full_num_parameters, tfim_ansatz, tfim_num_parameters,
    two_qubit_overparameterized_ansatz, two_qubit_overparameterized_num_parameters,
};
