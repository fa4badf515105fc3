use super::constants;
use crate::{
    layout,
    lower::{Lowering, push_const},
    ops::OperationSynthesizer,
};
use alloy_primitives::U256;
use dispatch_data::{
    ArrayLocation, Fragment, Member, MemberValue, TableLayout, TableLocation, WordGeometry,
};
use evm_glue::{assembler::assemble_minimized, assembly::Asm, opcodes::Opcode};
use revm::{
    Evm, InMemoryDB,
    primitives::{AccountInfo, Bytecode, ExecutionResult, Output, TransactTo, address},
};

/// Index of a fragment call within a [`FragmentProgram`]
pub type CallId = usize;

/// Value passed for a fragment parameter
#[derive(Debug, Clone, Copy)]
pub enum Arg {
    Value(U256),
    /// Result of an earlier call
    Result(CallId),
}

impl Arg {
    pub fn value(value: u64) -> Self {
        Arg::Value(U256::from(value))
    }
}

/// Runs a sequence of fragments in one transaction.
///
/// Parameters are stored into their slots before each call and every result is saved to the
/// results area, so later calls can consume it. The program returns the last result (or the one
/// chosen with [`FragmentProgram::returning`]). Jump targets added with
/// [`FragmentProgram::with_target`] return their marker instead.
pub struct FragmentProgram {
    lowering: Lowering,
    asm: Vec<Asm>,
    calls: usize,
    returning: Option<CallId>,
    targets: Vec<(String, U256)>,
}

impl FragmentProgram {
    pub fn new() -> Self {
        Self {
            lowering: Lowering::new(),
            asm: Vec::new(),
            calls: 0,
            returning: None,
            targets: Vec::new(),
        }
    }

    pub fn call(&mut self, fragment: &Fragment, args: &[(&str, Arg)]) -> CallId {
        let lowered = self.lowering.lower(fragment);
        assert_eq!(
            args.len(),
            lowered.param_slots.len(),
            "`{}` takes {:?}",
            fragment.name,
            lowered.param_slots
        );

        for &(name, arg) in args {
            let slot = lowered
                .param_slot(name)
                .unwrap_or_else(|| panic!("`{}` has no parameter `{name}`", fragment.name));
            match arg {
                Arg::Value(value) => push_const(value, &mut self.asm),
                Arg::Result(id) => {
                    push_const(U256::from(result_address(id)), &mut self.asm);
                    self.asm.push(Asm::Op(Opcode::MLOAD));
                }
            }
            push_const(U256::from(slot), &mut self.asm);
            self.asm.push(Asm::Op(Opcode::MSTORE));
        }

        self.asm.extend(lowered.asm);
        let id = self.calls;
        self.calls += 1;
        if lowered.has_result {
            push_const(U256::from(result_address(id)), &mut self.asm);
            self.asm.push(Asm::Op(Opcode::MSTORE));
            self.returning = Some(id);
        }
        id
    }

    pub fn returning(&mut self, id: CallId) -> &mut Self {
        self.returning = Some(id);
        self
    }

    /// Places the jump destination of `label`, returning `marker` when reached.
    pub fn with_target(&mut self, label: &str, marker: u64) -> &mut Self {
        self.targets.push((label.to_string(), U256::from(marker)));
        self
    }

    pub fn into_bytecode(mut self) -> Result<Vec<u8>, String> {
        match self.returning {
            Some(id) => {
                push_const(U256::from(result_address(id)), &mut self.asm);
                self.asm.push(Asm::Op(Opcode::MLOAD));
                emit_return_top(&mut self.asm);
            }
            None => self.asm.push(Asm::Op(Opcode::STOP)),
        }
        let placed: Vec<&str> = self.targets.iter().map(|(label, _)| label.as_str()).collect();
        if let Some((missing, _)) =
            self.lowering.marks().labels().find(|(label, _)| !placed.contains(label))
        {
            return Err(format!("Label `{missing}` is referenced but has no target"));
        }
        for (label, marker) in std::mem::take(&mut self.targets) {
            self.lowering.emit_label(&label, &mut self.asm);
            push_const(marker, &mut self.asm);
            emit_return_top(&mut self.asm);
        }

        let (_, bytecode) =
            assemble_minimized(&self.asm, true).map_err(|e| format!("Assembly failed: {:?}", e))?;
        Ok(bytecode)
    }

    pub fn execute(self) -> Result<U256, String> {
        execute_bytecode(self.into_bytecode()?)
    }
}

pub fn result_address(id: CallId) -> u32 {
    constants::RESULTS_BASE + 32 * id as u32
}

/// Returns the word on top of the stack.
fn emit_return_top(asm: &mut Vec<Asm>) {
    push_const(U256::ZERO, asm);
    asm.push(Asm::Op(Opcode::MSTORE));
    push_const(U256::from(32), asm);
    push_const(U256::ZERO, asm);
    asm.push(Asm::Op(Opcode::RETURN));
}

pub struct EvmBuilder {
    db: InMemoryDB,
    contract_address: revm::primitives::Address,
    caller_address: revm::primitives::Address,
    bytecode: Vec<u8>,
    gas_limit: u64,
}

impl EvmBuilder {
    pub fn new() -> Self {
        Self {
            db: InMemoryDB::default(),
            contract_address: address!("1000000000000000000000000000000000000000"),
            caller_address: address!("9000000000000000000000000000000000000000"),
            bytecode: Vec::new(),
            gas_limit: constants::TEST_GAS_LIMIT,
        }
    }

    pub fn with_bytecode(mut self, bytecode: Vec<u8>) -> Self {
        self.bytecode = bytecode;
        self
    }

    pub fn build(mut self) -> Evm<'static, (), InMemoryDB> {
        self.db.insert_account_info(
            self.contract_address,
            AccountInfo {
                balance: U256::ZERO,
                nonce: 0,
                code_hash: revm::primitives::keccak256(&self.bytecode),
                code: Some(Bytecode::new_raw(self.bytecode.clone().into())),
            },
        );

        self.db.insert_account_info(
            self.caller_address,
            AccountInfo {
                balance: U256::from(constants::TEST_ETH_BALANCE),
                nonce: 0,
                code_hash: revm::primitives::KECCAK_EMPTY,
                code: None,
            },
        );

        Evm::builder()
            .with_db(self.db)
            .modify_tx_env(|tx| {
                tx.caller = self.caller_address;
                tx.transact_to = TransactTo::Call(self.contract_address);
                tx.gas_limit = self.gas_limit;
                tx.gas_price = U256::from(1);
                tx.value = U256::ZERO;
            })
            .build()
    }
}

/// Executes `bytecode` and decodes the returned word, `0` when nothing is returned.
pub fn execute_bytecode(bytecode: Vec<u8>) -> Result<U256, String> {
    let mut evm = EvmBuilder::new().with_bytecode(bytecode).build();
    let result = evm.transact_commit().map_err(|e| format!("Execution error: {:?}", e))?;

    match result {
        ExecutionResult::Success { output: Output::Call(bytes), .. } => {
            if bytes.len() >= 32 {
                Ok(U256::from_be_slice(&bytes[..32]))
            } else if bytes.is_empty() {
                Ok(U256::ZERO)
            } else {
                Err(format!("Unexpected return data length: {}", bytes.len()))
            }
        }
        ExecutionResult::Success { output, .. } => Err(format!("Unexpected output: {:?}", output)),
        ExecutionResult::Revert { output, .. } => Err(format!("Reverted: {:?}", output)),
        ExecutionResult::Halt { reason, .. } => Err(format!("Halted: {:?}", reason)),
    }
}

pub fn geometry(element_bits: u32) -> WordGeometry {
    WordGeometry::new(element_bits).expect("valid element size")
}

pub fn synthesizer(element_bits: u32, location: TableLocation) -> OperationSynthesizer {
    OperationSynthesizer::new(geometry(element_bits), location).expect("supported location")
}

/// Layout of literal `(position, value)` pairs.
pub fn literal_layout(pairs: &[(u32, u64)], element_bits: u32) -> TableLayout {
    let members = pairs
        .iter()
        .map(|&(position, value)| {
            Member::new(position, MemberValue::Literal(U256::from(value)), format!("p{position}"))
        })
        .collect();
    layout::plan(members, geometry(element_bits)).expect("valid layout")
}

/// All-zero layout spanning `segments` words.
pub fn empty_layout(segments: u32, element_bits: u32) -> TableLayout {
    let last = segments * geometry(element_bits).elements_per_word() - 1;
    literal_layout(&[(last, 0)], element_bits)
}

/// Layout of callables `(position, label)`.
pub fn callable_layout(pairs: &[(u32, &str)]) -> TableLayout {
    let members = pairs
        .iter()
        .map(|&(position, label)| {
            Member::new(position, MemberValue::Callable(label.to_string()), label)
        })
        .collect();
    layout::plan(members, geometry(constants::TEST_ELEMENT_BITS)).expect("valid layout")
}

/// Argument naming the table for a fragment at `location`.
pub fn table_arg(location: TableLocation, word: Arg) -> (&'static str, Arg) {
    match location {
        TableLocation::Word => ("word", word),
        TableLocation::Array(ArrayLocation::Memory) => {
            ("base", Arg::value(constants::TEST_MEMORY_BASE))
        }
        TableLocation::Array(ArrayLocation::Storage) => {
            ("base", Arg::value(constants::TEST_STORAGE_BASE))
        }
    }
}

/// Table handle used by the fragments following `create`: the created word for word tables,
/// the base for array tables.
pub struct TableRun {
    pub program: FragmentProgram,
    pub location: TableLocation,
    word: Option<CallId>,
}

impl TableRun {
    /// Starts a program creating `layout`.
    pub fn create(synth: &OperationSynthesizer, layout: &TableLayout) -> Self {
        let create = synth.create("create", layout).expect("create fragment");
        let mut program = FragmentProgram::new();
        let location = synth.location();
        let word = match location {
            TableLocation::Word => Some(program.call(&create, &[])),
            TableLocation::Array(_) => {
                program.call(&create, &[table_arg(location, Arg::value(0))]);
                None
            }
        };
        Self { program, location, word }
    }

    fn table(&self) -> (&'static str, Arg) {
        table_arg(self.location, Arg::Result(self.word.unwrap_or_default()))
    }

    pub fn write(&mut self, fragment: &Fragment, key: u32, value: u64) {
        let args =
            [self.table(), ("key", Arg::value(u64::from(key))), ("value", Arg::value(value))];
        let id = self.program.call(fragment, &args);
        if self.location == TableLocation::Word {
            self.word = Some(id);
        }
    }

    /// Calls a fragment taking the table and a key. Its result, if any, becomes the program's.
    pub fn lookup(&mut self, fragment: &Fragment, key: u32) -> CallId {
        let args = [self.table(), ("key", Arg::value(u64::from(key)))];
        self.program.call(fragment, &args)
    }
}
