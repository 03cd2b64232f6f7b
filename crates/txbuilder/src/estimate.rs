//! Gas and fee estimation.
//!
//! The fee of a transaction is the gas it consumes, priced at the VM gas rate. Gas has two
//! parts:
//!
//! - storage gas, proportional to the transaction's size once signed
//! - VM gas, for running the control programs of its spends
//!
//! Estimation happens before signing, so the size of the signatures is approximated from the
//! signing instructions, at `BASE_WITNESS_SIZE` per required signature.
//!
//! The total fee is rounded up to a multiple of the base rate. The storage and VM fees are
//! reported unrounded, so they need not add up to the total.

use serde::{Deserialize, Serialize};
use sidechain_core::ProgramType;

use crate::{
    config::GasRates,
    error::{Error, Result},
    template::{SigningInstruction, Template},
};

/// Size allowance per required signature.
pub const BASE_WITNESS_SIZE: u64 = 300;

/// VM gas of a P2WPKH spend.
pub const P2WPKH_GAS: u64 = 1419;

/// Fixed VM gas of each P2WSH witness component.
pub const P2WSH_BASE_GAS: u64 = 738;

/// Estimated fees of a transaction, in the native asset's smallest unit.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq, Default)]
pub struct EstimateTxGasResp {
    /// Total fee, rounded up to a multiple of the base rate
    pub total_neu: u64,
    /// Storage fee, unrounded
    pub storage_neu: u64,
    /// VM fee, unrounded
    pub vm_neu: u64,
}

/// The estimated size of the signatures a set of instructions asks for.
pub fn estimate_sign_size(instructions: &[SigningInstruction]) -> Result<u64> {
    let mut size: u64 = 0;
    for component in instructions
        .iter()
        .flat_map(|instruction| instruction.witness_components.iter())
    {
        size = component
            .quorum()
            .checked_mul(BASE_WITNESS_SIZE)
            .and_then(|component_size| size.checked_add(component_size))
            .ok_or(Error::GasOverflow("sign size"))?;
    }
    Ok(size)
}

/// The VM gas of a P2WSH spend.
///
/// `OP_CHECKMULTISIG` costs `984 * keys - 72 * quorum - 63` on top of a fixed cost per
/// component.
pub fn estimate_p2wsh_gas(instruction: &SigningInstruction) -> Result<u64> {
    let mut gas: u64 = 0;
    for component in instruction.witness_components.iter() {
        let component_gas = component
            .key_count()
            .checked_mul(984)
            .and_then(|g| g.checked_add(P2WSH_BASE_GAS))
            .and_then(|g| g.checked_sub(component.quorum().checked_mul(72)?))
            .and_then(|g| g.checked_sub(63))
            .ok_or(Error::GasOverflow("p2wsh gas"))?;
        gas = gas
            .checked_add(component_gas)
            .ok_or(Error::GasOverflow("p2wsh gas"))?;
    }
    Ok(gas)
}

/// The VM gas of every input of the template, in input order.
///
/// Inputs whose spend or spent output cannot be resolved, and inputs with non-standard
/// programs, consume no VM gas. A P2WSH input without a signing instruction consumes none
/// either.
pub fn estimate_vm_gas(template: &Template) -> Result<Vec<u64>> {
    let tx = &template.transaction;
    let mut gas = Vec::with_capacity(tx.input_ids().len());
    for (position, input_id) in tx.input_ids().iter().enumerate() {
        let spend = match tx.spend(input_id) {
            Ok(spend) => spend,
            Err(_) => {
                gas.push(0);
                continue;
            }
        };
        let spent = match tx.output(&spend.spent_output_id()) {
            Ok(spent) => spent,
            Err(_) => {
                gas.push(0);
                continue;
            }
        };
        let input_gas = match spent.control_program.standard_type() {
            ProgramType::P2WPKH => P2WPKH_GAS,
            ProgramType::P2WSH => match template.signing_instruction(position as u64) {
                Some(instruction) => estimate_p2wsh_gas(instruction)?,
                None => 0,
            },
            ProgramType::NonStandard => 0,
        };
        gas.push(input_gas);
    }
    Ok(gas)
}

/// Estimate the fees of a template before signing.
///
/// Pure: the same template and rates always produce the same estimate.
pub fn estimate_tx_gas(template: &Template, rates: &GasRates) -> Result<EstimateTxGasResp> {
    let base_size = template.transaction.base_size() as u64;
    let sign_size = estimate_sign_size(&template.signing_instructions)?;

    let storage_gas = base_size
        .checked_add(sign_size)
        .and_then(|size| size.checked_mul(rates.storage_gas_rate))
        .ok_or(Error::GasOverflow("storage gas"))?;

    let vm_gas = estimate_vm_gas(template)?
        .into_iter()
        .try_fold(0u64, u64::checked_add)
        .ok_or(Error::GasOverflow("vm gas"))?;

    let total_gas = storage_gas
        .checked_add(vm_gas)
        .ok_or(Error::GasOverflow("total gas"))?;

    let total_neu = total_gas
        .checked_mul(rates.vm_gas_rate)
        .and_then(|neu| round_up(neu, rates.base_rate))
        .ok_or(Error::GasOverflow("total neu"))?;

    Ok(EstimateTxGasResp {
        total_neu,
        storage_neu: storage_gas
            .checked_mul(rates.vm_gas_rate)
            .ok_or(Error::GasOverflow("storage neu"))?,
        vm_neu: vm_gas
            .checked_mul(rates.vm_gas_rate)
            .ok_or(Error::GasOverflow("vm neu"))?,
    })
}

/// Round `value` up to a multiple of `unit`. `None` on overflow or a zero unit.
fn round_up(value: u64, unit: u64) -> Option<u64> {
    let units = value.checked_div(unit)?;
    let units = if value % unit == 0 { units } else { units + 1 };
    units.checked_mul(unit)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{template::WitnessComponent, testing::*};
    use sidechain_core::{AssetId, NATIVE_ASSET_ID};

    fn p2wpkh_template() -> Template {
        Template::new(
            tx_with(
                vec![spend_input(p2wpkh_program(1), NATIVE_ASSET_ID, 1_000)],
                vec![output(p2wpkh_program(2), NATIVE_ASSET_ID, 900)],
            ),
            vec![instruction(0, vec![WitnessComponent::RawTxSignature(multisig(1, 1))])],
        )
    }

    fn p2wsh_template(quorum: u64, keys: usize) -> Template {
        Template::new(
            tx_with(
                vec![spend_input(p2wsh_program(1), NATIVE_ASSET_ID, 1_000)],
                vec![output(p2wpkh_program(2), NATIVE_ASSET_ID, 900)],
            ),
            vec![instruction(0, vec![WitnessComponent::Signature(multisig(quorum, keys))])],
        )
    }

    #[test]
    fn it_prices_p2wpkh_spends() {
        let template = p2wpkh_template();
        let rates = GasRates::default();
        let estimate = estimate_tx_gas(&template, &rates).unwrap();
        assert_eq!(estimate.vm_neu, 1419 * 200);

        let base = template.transaction.base_size() as u64;
        assert_eq!(estimate.storage_neu, (base + 300) * 200);
    }

    #[test]
    fn it_prices_p2wsh_multisig() {
        let instruction = instruction(0, vec![WitnessComponent::Signature(multisig(2, 3))]);
        assert_eq!(estimate_p2wsh_gas(&instruction).unwrap(), 3483);

        let estimate = estimate_tx_gas(&p2wsh_template(2, 3), &GasRates::default()).unwrap();
        assert_eq!(estimate.vm_neu, 3483 * 200);
    }

    #[test]
    fn it_sums_every_p2wsh_component() {
        let instruction = instruction(
            0,
            vec![
                WitnessComponent::Signature(multisig(2, 3)),
                WitnessComponent::RawTxSignature(multisig(1, 1)),
            ],
        );
        // 3483 + (738 + 984 - 72 - 63)
        assert_eq!(estimate_p2wsh_gas(&instruction).unwrap(), 3483 + 1587);
    }

    #[test]
    fn it_rejects_negative_p2wsh_gas() {
        let instruction = instruction(0, vec![WitnessComponent::Signature(multisig(100, 1))]);
        assert!(matches!(estimate_p2wsh_gas(&instruction), Err(Error::GasOverflow(_))));
    }

    #[test]
    fn it_rounds_only_the_total() {
        let template = p2wpkh_template();
        let rates = GasRates::default();
        let estimate = estimate_tx_gas(&template, &rates).unwrap();

        let unrounded = estimate.storage_neu + estimate.vm_neu;
        assert_eq!(estimate.total_neu % rates.base_rate, 0);
        assert!(estimate.total_neu >= unrounded);
        assert!(estimate.total_neu < unrounded + rates.base_rate);
    }

    #[test]
    fn it_is_pure() {
        let template = p2wsh_template(2, 3);
        let rates = GasRates::default();
        assert_eq!(
            estimate_tx_gas(&template, &rates).unwrap(),
            estimate_tx_gas(&template, &rates).unwrap()
        );
    }

    #[test]
    fn it_doubles_sign_size_with_quorum() {
        let rates = GasRates::default();
        let mut template = p2wpkh_template();
        let single = estimate_tx_gas(&template, &rates).unwrap();
        let single_sign = estimate_sign_size(&template.signing_instructions).unwrap();

        for instruction in template.signing_instructions.iter_mut() {
            for component in instruction.witness_components.iter_mut() {
                component.multisig_mut().quorum *= 2;
            }
        }
        let double = estimate_tx_gas(&template, &rates).unwrap();
        let double_sign = estimate_sign_size(&template.signing_instructions).unwrap();

        let base = template.transaction.base_size() as u64;
        assert_eq!(double_sign, 2 * single_sign);
        assert_eq!(double.storage_neu, (base + double_sign) * rates.vm_gas_rate);
        assert_eq!(double.vm_neu, single.vm_neu);
    }

    #[test]
    fn it_skips_unresolvable_and_nonstandard_inputs() {
        let issue = sidechain_core::TxInput::new(sidechain_core::types::InputCommitment::Coinbase(
            sidechain_core::HexBytes::new(vec![1]),
        ));
        let template = Template::new(
            tx_with(
                vec![
                    issue,
                    spend_input(
                        sidechain_core::ControlProgram::new(vec![0x51]),
                        AssetId::default(),
                        5,
                    ),
                    spend_input(p2wsh_program(3), NATIVE_ASSET_ID, 5),
                ],
                vec![output(p2wpkh_program(2), NATIVE_ASSET_ID, 5)],
            ),
            vec![],
        );
        assert_eq!(estimate_vm_gas(&template).unwrap(), vec![0, 0, 0]);
        assert_eq!(
            estimate_tx_gas(&template, &GasRates::default()).unwrap().vm_neu,
            0
        );
    }

    #[test]
    fn it_reports_overflow() {
        let rates = GasRates {
            storage_gas_rate: u64::MAX,
            ..Default::default()
        };
        assert!(matches!(
            estimate_tx_gas(&p2wpkh_template(), &rates),
            Err(Error::GasOverflow(_))
        ));

        let rates = GasRates {
            base_rate: 0,
            ..Default::default()
        };
        assert!(matches!(
            estimate_tx_gas(&p2wpkh_template(), &rates),
            Err(Error::GasOverflow("total neu"))
        ));
    }

    #[test]
    fn it_rounds_up_to_the_unit() {
        assert_eq!(round_up(0, 10), Some(0));
        assert_eq!(round_up(1, 10), Some(10));
        assert_eq!(round_up(10, 10), Some(10));
        assert_eq!(round_up(11, 10), Some(20));
        assert_eq!(round_up(u64::MAX, 10), None);
        assert_eq!(round_up(5, 0), None);
    }
}
