use hashbrown::HashMap;

use crate::frontend::ast::SemanticType;

/// Stack of nested scope frames. Lookups search from the innermost frame
/// outward; insertion always targets the innermost frame. The parser checks
/// for redefinitions across the whole stack before inserting.
#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<HashMap<String, SemanticType>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_frame(&mut self) {
        self.frames.push(HashMap::new());
    }

    /// Pops the innermost frame, returning its name map so it can be attached
    /// to the AST node that owned the scope.
    pub fn pop_frame(&mut self) -> HashMap<String, SemanticType> {
        self.frames.pop().expect("scope stack underflow")
    }

    pub fn lookup(&self, name: &str) -> Option<SemanticType> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name).copied())
    }

    pub fn insert(&mut self, name: impl Into<String>, ty: SemanticType) {
        self.frames
            .last_mut()
            .expect("scope stack underflow")
            .insert(name.into(), ty);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub return_type: SemanticType,
    /// Declared parameter types in order
    pub parameter_types: Vec<SemanticType>,
    pub is_built_in: bool,
}

/// Flat map of function name to signature. Signatures are recorded before
/// their bodies are parsed so self-recursive calls resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionTable {
    functions: HashMap<String, FunctionSignature>,
}

impl FunctionTable {
    /// Table pre-seeded with the built-in print functions.
    pub fn with_builtins() -> Self {
        let mut functions = HashMap::new();

        functions.insert(
            "printVarInt".to_owned(),
            FunctionSignature {
                return_type: SemanticType::Void,
                parameter_types: vec![SemanticType::Int],
                is_built_in: true,
            },
        );
        functions.insert(
            "printVarFloat".to_owned(),
            FunctionSignature {
                return_type: SemanticType::Void,
                parameter_types: vec![SemanticType::Float],
                is_built_in: true,
            },
        );

        Self { functions }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&FunctionSignature> {
        self.functions.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, signature: FunctionSignature) {
        self.functions.insert(name.into(), signature);
    }
}
