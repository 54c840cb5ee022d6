//! The recovered syntax tree.
//!
//! Nodes live in an index-addressed arena owned by the module; a `NodeId` is
//! a node's identity. Sharing a `NodeId` between two parents is legal (the
//! `DUP` instruction produces exactly that) and the emitter prints the
//! shared subtree twice. Nothing is freed until the arena drops.

use crate::pcode::Opcode;

/// Index of a node in the [`AstArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(pub usize);

/// Index of a variable in the [`VarArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarId(pub usize);

#[derive(Default)]
pub struct AstArena {
  nodes: Vec<NodeKind>,
}

impl AstArena {
  /// Pushes a new node and returns its id.
  pub fn push(&mut self, node: NodeKind) -> NodeId {
    self.nodes.push(node);
    NodeId(self.nodes.len() - 1)
  }

  pub fn get(&self, id: NodeId) -> &NodeKind {
    &self.nodes[id.0]
  }

  pub fn get_mut(&mut self, id: NodeId) -> &mut NodeKind {
    &mut self.nodes[id.0]
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }
}

#[derive(Default)]
pub struct VarArena {
  vars: Vec<Var>,
}

impl VarArena {
  pub fn push(&mut self, var: Var) -> VarId {
    self.vars.push(var);
    VarId(self.vars.len() - 1)
  }

  pub fn get(&self, id: VarId) -> &Var {
    &self.vars[id.0]
  }

  pub fn get_mut(&mut self, id: VarId) -> &mut Var {
    &mut self.vars[id.0]
  }
}

/// Storage class of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
  Local,
  Map,
  World,
  Global,
}

/// Value type tag, as far as the object format records one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spec {
  None,
  Void,
  Raw,
  Int,
  Fixed,
  Bool,
  Str,
}

/// A recovered variable. Materialized on first use when no chunk declared
/// it beforehand.
#[derive(Debug)]
pub struct Var {
  pub name: String,
  pub storage: Storage,
  pub index: u32,
  pub spec: Spec,
  pub array: bool,
  pub dim_length: u32,
  pub imported: bool,
  /// Set once a declaration for the variable has been emitted or promoted.
  pub declared: bool,
  /// Set once the variable has been read; blocks first-assignment promotion.
  pub used: bool,
  /// Scalar initializer from `MINI` or from promotion.
  pub initz: Option<NodeId>,
  /// Array initializer values from `AINI`, sparse.
  pub values: Vec<InitValue>,
}

impl Var {
  pub fn new() -> Self {
    Var {
      name: String::new(),
      storage: Storage::Local,
      index: 0,
      spec: Spec::Int,
      array: false,
      dim_length: 0,
      imported: false,
      declared: false,
      used: false,
      initz: None,
      values: vec![],
    }
  }
}

impl Default for Var {
  fn default() -> Self {
    Var::new()
  }
}

/// One element of a sparse array initializer.
#[derive(Debug, Clone, Copy)]
pub struct InitValue {
  pub index: i32,
  pub value: i32,
  /// True when `ASTR` marked the element as a string-table index.
  pub string: bool,
}

/// Every node the recoverer can produce, statements and expressions alike.
#[derive(Debug)]
pub enum NodeKind {
  // Expressions.
  Literal(i32),
  NameUsage(&'static str),
  VarUsage(VarId),
  Unary(UnaryNode),
  Binary(BinaryNode),
  Assign(AssignNode),
  Inc(IncNode),
  Subscript(SubscriptNode),
  Paren(NodeId),
  Call(CallNode),
  PalTrans(PalTransNode),
  StrCpyCall(StrCpyNode),

  // Statements.
  Block(BlockNode),
  If(IfStmtNode),
  Switch(SwitchStmtNode),
  CaseLabel(CaseLabelNode),
  While(LoopStmtNode),
  DoWhile(LoopStmtNode),
  For(ForStmtNode),
  Jump(JumpKind),
  ScriptJump(ScriptJumpKind),
  Return(Option<NodeId>),
  InlineAsm(InlineAsmNode),
  ExprStmt(NodeId),
  VarDec(VarId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
  Minus,
  LogicalNot,
  BitwiseNot,
}

#[derive(Debug)]
pub struct UnaryNode {
  pub op: UnaryOp,
  pub operand: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  LogOr,
  LogAnd,
  BitOr,
  BitXor,
  BitAnd,
  Eq,
  Neq,
  Lt,
  Lte,
  Gt,
  Gte,
  ShiftL,
  ShiftR,
  Add,
  Sub,
  Mul,
  Div,
  Mod,
}

#[derive(Debug)]
pub struct BinaryNode {
  pub op: BinaryOp,
  pub lside: NodeId,
  pub rside: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
  Simple,
  Add,
  Sub,
  Mul,
  Div,
  Mod,
  ShiftL,
  ShiftR,
  BitAnd,
  BitXor,
  BitOr,
}

#[derive(Debug)]
pub struct AssignNode {
  pub op: AssignOp,
  pub lside: NodeId,
  pub rside: NodeId,
}

#[derive(Debug)]
pub struct IncNode {
  pub decrement: bool,
  pub post: bool,
  pub operand: NodeId,
}

#[derive(Debug)]
pub struct SubscriptNode {
  pub lside: NodeId,
  pub index: NodeId,
}

/// Who a call resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callee {
  /// Action special, by name out of the fixed table.
  Aspec(&'static str),
  /// Dedicated function, by catalog index.
  Ded(usize),
  /// Format (print-family) function, by catalog index.
  Format(usize),
  /// Extension function, by catalog index.
  Ext(usize),
  /// Internal (idiom) function, by catalog index.
  Intern(usize),
  /// User function, by module index.
  User(usize),
  UnknownAspec(i32),
  UnknownExt(i32),
}

#[derive(Debug)]
pub struct CallNode {
  pub callee: Callee,
  /// Arguments were literals encoded inline in the instruction.
  pub direct: bool,
  /// Present only for format calls.
  pub format_items: Option<Vec<FormatItem>>,
  pub args: Vec<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatCast {
  Decimal,
  String,
  Char,
  Fixed,
  Name,
  LocalString,
  Key,
  Binary,
  Hex,
  Array,
}

#[derive(Debug)]
pub struct FormatItem {
  pub cast: FormatCast,
  pub value: NodeId,
  /// `(offset, length)` pair of the long array form.
  pub extra: Option<FormatItemArray>,
}

#[derive(Debug)]
pub struct FormatItemArray {
  pub offset: NodeId,
  pub length: NodeId,
}

#[derive(Debug)]
pub struct PalTransNode {
  pub number: NodeId,
  pub ranges: Vec<PalRange>,
}

#[derive(Debug)]
pub struct PalRange {
  pub begin: NodeId,
  pub end: NodeId,
  pub value: PalRangeValue,
}

#[derive(Debug)]
pub enum PalRangeValue {
  Colon {
    begin: NodeId,
    end: NodeId,
  },
  Rgb {
    saturated: bool,
    red1: NodeId,
    green1: NodeId,
    blue1: NodeId,
    red2: NodeId,
    green2: NodeId,
    blue2: NodeId,
  },
  Colorisation {
    red: NodeId,
    green: NodeId,
    blue: NodeId,
  },
  Tint {
    amount: NodeId,
    red: NodeId,
    green: NodeId,
    blue: NodeId,
  },
}

#[derive(Debug)]
pub struct StrCpyNode {
  pub array: NodeId,
  pub array_offset: NodeId,
  pub array_length: NodeId,
  pub string: NodeId,
  pub offset: NodeId,
}

#[derive(Debug, Default)]
pub struct BlockNode {
  pub stmts: Vec<NodeId>,
}

#[derive(Debug)]
pub struct IfStmtNode {
  pub cond: NodeId,
  pub body: NodeId,
  pub else_body: Option<NodeId>,
}

#[derive(Debug)]
pub struct SwitchStmtNode {
  pub cond: NodeId,
  pub body: NodeId,
}

#[derive(Debug)]
pub struct CaseLabelNode {
  pub value: i32,
  pub default_case: bool,
}

#[derive(Debug)]
pub struct LoopStmtNode {
  pub cond: NodeId,
  pub body: NodeId,
  pub until: bool,
}

#[derive(Debug)]
pub struct ForStmtNode {
  pub cond: NodeId,
  pub post: Vec<NodeId>,
  pub body: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpKind {
  Break,
  Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptJumpKind {
  Terminate,
  Restart,
  Suspend,
}

/// Fallback for an instruction the recoverer cannot lift.
#[derive(Debug)]
pub struct InlineAsmNode {
  pub opcode: Opcode,
  pub args: Vec<i32>,
}
