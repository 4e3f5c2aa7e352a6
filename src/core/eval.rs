use std::rc::Rc;

use crate::JSError;
use crate::core::ast::*;
use crate::core::{
    Context, EnvKind, EnvPtr, FunctionData, FunctionKind, Hint, JSString, ObjectData, Script, ScriptFunction, Value, abstract_equals,
    check_object_coercible, define_data_property, env_create_binding, env_delete_binding, env_get_value, env_has_binding,
    env_set_if_found, f64_to_int32, f64_to_uint32, get_property, index_string, is_callable, new_array, new_declarative_env, new_object,
    new_object_env, obj_call, obj_construct, obj_delete, obj_get, obj_put, strict_equals, to_boolean, to_number, to_object, to_primitive,
    to_string, type_of,
};
use crate::core::define_accessor_property;
use crate::js_error::{throw_reference_error, throw_syntax_error, throw_type_error};

/// 8.9 completion record, minus Throw: thrown values travel as
/// `Err(JSError::Thrown(_))` so that `?` is the propagation rule.
#[derive(Clone, Debug)]
pub enum Completion {
    Normal,
    Break(Option<JSString>),
    Continue(Option<JSString>),
    Return(Value),
}

/// Stack-allocated chain of the labels attached to the statement currently
/// being evaluated.
struct LabelList<'a> {
    label: &'a JSString,
    next: Option<&'a LabelList<'a>>,
}

fn label_match(target: &Option<JSString>, labels: Option<&LabelList>) -> bool {
    let Some(t) = target else {
        return true;
    };
    let mut cur = labels;
    while let Some(ll) = cur {
        if ll.label == t {
            return true;
        }
        cur = ll.next;
    }
    false
}

enum LoopFlow {
    Next,
    Exit(Completion),
}

/// Evaluates a parsed script against the context's global object. The
/// result is the value of the last expression statement.
pub fn eval_script(ctx: &Context, script: &Rc<Script>) -> Result<Value, JSError> {
    let global_env = new_object_env(ctx.global(), false, None);
    let mut interp = Interpreter {
        ctx: ctx.clone(),
        script: script.clone(),
        env: global_env,
        this_val: Value::Object(ctx.global()),
        strict: false,
        value: Value::Undefined,
    };
    interp.hoist_functions(&script.program.body)?;
    interp.hoist_variables(&script.program.body)?;
    for stmt in &script.program.body {
        match interp.exec_stmt(stmt, None)? {
            Completion::Normal => {}
            Completion::Return(_) => return Err(throw_syntax_error(ctx, "return outside of function")),
            Completion::Break(_) | Completion::Continue(_) => {
                return Err(throw_syntax_error(ctx, "illegal break or continue"));
            }
        }
    }
    Ok(interp.value)
}

/// 10.4.3 / 10.5: enters function code. The caller has already applied the
/// `this` coercion rules; this sets up the declarative frame, parameters,
/// the `arguments` object and hoisting, then runs the body.
pub fn call_script_function(ctx: &Context, func: &ScriptFunction, this_val: Value, args: &[Value]) -> Result<Value, JSError> {
    let env = new_declarative_env(Some(func.scope.clone()));

    let arguments_obj = new_object(Some(ctx.object_proto()));
    for (i, arg) in args.iter().enumerate() {
        define_data_property(&arguments_obj, &index_string(i as u32), arg.clone(), true, true, true);
    }
    define_data_property(
        &arguments_obj,
        &JSString::intern("length"),
        Value::int_or_number(args.len() as f64),
        true,
        true,
        true,
    );

    let mut interp = Interpreter {
        ctx: ctx.clone(),
        script: func.script.clone(),
        env: env.clone(),
        this_val,
        strict: func.strict,
        value: Value::Undefined,
    };
    for (i, param) in func.code.params.iter().enumerate() {
        let name = interp.sym(*param);
        let value = args.get(i).cloned().unwrap_or(Value::Undefined);
        env_create_binding(ctx, &env, &name, value, false, false)?;
    }
    env_create_binding(
        ctx,
        &env,
        &JSString::intern("arguments"),
        Value::Object(arguments_obj),
        func.strict,
        false,
    )?;

    interp.hoist_functions(&func.code.body)?;
    interp.hoist_variables(&func.code.body)?;

    for stmt in &func.code.body {
        match interp.exec_stmt(stmt, None)? {
            Completion::Normal => {}
            Completion::Return(v) => return Ok(v),
            Completion::Break(_) | Completion::Continue(_) => {
                return Err(throw_syntax_error(ctx, "illegal break or continue"));
            }
        }
    }
    Ok(Value::Undefined)
}

struct Interpreter {
    ctx: Context,
    script: Rc<Script>,
    env: EnvPtr,
    this_val: Value,
    strict: bool,
    /// Value of the most recent expression statement; what `eval` returns.
    value: Value,
}

impl Interpreter {
    fn sym(&self, sym: Sym) -> JSString {
        self.script.strings[sym as usize].clone()
    }

    // ── Declaration hoisting ────────────────────────────────────────────

    /// Pass 1: instantiate every function declaration. Descends into
    /// compound statements but never into nested function bodies.
    fn hoist_functions(&mut self, body: &[Stmt]) -> Result<(), JSError> {
        for stmt in body {
            self.hoist_functions_stmt(stmt)?;
        }
        Ok(())
    }

    fn hoist_functions_stmt(&mut self, stmt: &Stmt) -> Result<(), JSError> {
        match &stmt.kind {
            StmtKind::Block(body) => self.hoist_functions(body),
            StmtKind::If(_, consequent, alternate) => {
                self.hoist_functions_stmt(consequent)?;
                if let Some(alt) = alternate {
                    self.hoist_functions_stmt(alt)?;
                }
                Ok(())
            }
            StmtKind::Labeled(_, inner) => self.hoist_functions_stmt(inner),
            StmtKind::With(_, body) => self.hoist_functions_stmt(body),
            StmtKind::Try { block, handler, finalizer } => {
                self.hoist_functions_stmt(block)?;
                if let Some(h) = handler {
                    self.hoist_functions_stmt(&h.body)?;
                }
                if let Some(f) = finalizer {
                    self.hoist_functions_stmt(f)?;
                }
                Ok(())
            }
            StmtKind::While(_, body) | StmtKind::DoWhile(body, _) => self.hoist_functions_stmt(body),
            StmtKind::For { body, .. } | StmtKind::ForIn { body, .. } => self.hoist_functions_stmt(body),
            StmtKind::FunctionDecl(node) => {
                let Some(id) = node.id else {
                    return Ok(());
                };
                let func = self.new_function_object(node)?;
                let name = self.sym(id);
                self.define_variable(&name, func, true)
            }
            _ => Ok(()),
        }
    }

    /// Pass 2: create every `var` binding as undefined; existing bindings
    /// (including pass-1 functions) are left alone.
    fn hoist_variables(&mut self, body: &[Stmt]) -> Result<(), JSError> {
        for stmt in body {
            self.hoist_variables_stmt(stmt)?;
        }
        Ok(())
    }

    fn hoist_variables_stmt(&mut self, stmt: &Stmt) -> Result<(), JSError> {
        match &stmt.kind {
            StmtKind::Block(body) => self.hoist_variables(body),
            StmtKind::Labeled(_, inner) => self.hoist_variables_stmt(inner),
            StmtKind::If(_, consequent, alternate) => {
                self.hoist_variables_stmt(consequent)?;
                if let Some(alt) = alternate {
                    self.hoist_variables_stmt(alt)?;
                }
                Ok(())
            }
            StmtKind::With(_, body) => self.hoist_variables_stmt(body),
            StmtKind::Try { block, handler, finalizer } => {
                self.hoist_variables_stmt(block)?;
                if let Some(h) = handler {
                    self.hoist_variables_stmt(&h.body)?;
                }
                if let Some(f) = finalizer {
                    self.hoist_variables_stmt(f)?;
                }
                Ok(())
            }
            StmtKind::While(_, body) | StmtKind::DoWhile(body, _) => self.hoist_variables_stmt(body),
            StmtKind::For { init, body, .. } => {
                if let Some(ForInit::VarDecl(decls)) = init {
                    self.declare_vars(decls)?;
                }
                self.hoist_variables_stmt(body)
            }
            StmtKind::ForIn { left, body, .. } => {
                if let ForInTarget::VarDecl(decls) = left {
                    self.declare_vars(decls)?;
                }
                self.hoist_variables_stmt(body)
            }
            StmtKind::VarDecl(decls) => self.declare_vars(decls),
            _ => Ok(()),
        }
    }

    fn declare_vars(&mut self, decls: &[VarDeclarator]) -> Result<(), JSError> {
        for decl in decls {
            let name = self.sym(decl.id);
            self.define_variable(&name, Value::Undefined, false)?;
        }
        Ok(())
    }

    /// Defines a binding in the current frame. `overwrite` distinguishes
    /// function declarations (rebind) from `var` (no-op when present).
    fn define_variable(&mut self, name: &JSString, v: Value, overwrite: bool) -> Result<(), JSError> {
        if env_has_binding(&self.env, name) {
            if overwrite {
                env_set_if_found(&self.ctx, &self.env, name, v, false)?;
            }
            return Ok(());
        }
        env_create_binding(&self.ctx, &self.env, name, v, false, false)
    }

    // ── Identifier resolution ───────────────────────────────────────────

    /// 10.3.1: walks the environment chain; returns the holding frame and
    /// the bound value.
    fn resolve(&mut self, name: &JSString) -> Result<Option<(EnvPtr, Value)>, JSError> {
        let mut env = Some(self.env.clone());
        while let Some(e) = env {
            if env_has_binding(&e, name) {
                let v = env_get_value(&self.ctx, &e, name)?.unwrap_or(Value::Undefined);
                return Ok(Some((e, v)));
            }
            env = e.borrow().outer.clone();
        }
        Ok(None)
    }

    /// Assigns through the chain; unresolved names create a global property
    /// (non-strict) or raise ReferenceError (strict).
    fn resolve_and_put(&mut self, name: &JSString, v: Value) -> Result<(), JSError> {
        let mut env = Some(self.env.clone());
        while let Some(e) = env {
            if env_set_if_found(&self.ctx, &e, name, v.clone(), self.strict)? {
                return Ok(());
            }
            env = e.borrow().outer.clone();
        }
        if self.strict {
            return Err(throw_reference_error(&self.ctx, &format!("{name} is not defined")));
        }
        obj_put(&self.ctx, &self.ctx.global(), name, v, false)
    }

    /// Writes to a binding already located in `env`.
    fn put_value_with_env(&mut self, env: &EnvPtr, name: &JSString, v: Value) -> Result<(), JSError> {
        let target = match &env.borrow().kind {
            EnvKind::Declarative(_) => None,
            EnvKind::Object { bindings, .. } => Some(bindings.clone()),
        };
        if let Some(target) = target {
            return obj_put(&self.ctx, &target, name, v, self.strict);
        }
        env_set_if_found(&self.ctx, env, name, v, self.strict)?;
        Ok(())
    }

    // ── Statements ──────────────────────────────────────────────────────

    fn exec_stmt(&mut self, stmt: &Stmt, labels: Option<&LabelList>) -> Result<Completion, JSError> {
        match &stmt.kind {
            StmtKind::Empty | StmtKind::FunctionDecl(_) => Ok(Completion::Normal),
            StmtKind::Debugger => {
                log::debug!("debugger statement at line {}", stmt.span.start.line);
                Ok(Completion::Normal)
            }
            StmtKind::Block(body) => {
                for s in body {
                    let c = self.exec_stmt(s, None)?;
                    if !matches!(c, Completion::Normal) {
                        return Ok(c);
                    }
                }
                Ok(Completion::Normal)
            }
            StmtKind::Expression(expr) => {
                self.value = self.eval_expr(expr)?;
                Ok(Completion::Normal)
            }
            StmtKind::If(test, consequent, alternate) => {
                let t = self.eval_expr(test)?;
                if to_boolean(&t) {
                    self.exec_stmt(consequent, None)
                } else if let Some(alt) = alternate {
                    self.exec_stmt(alt, None)
                } else {
                    Ok(Completion::Normal)
                }
            }
            StmtKind::Labeled(sym, inner) => {
                let label = self.sym(*sym);
                let list = LabelList {
                    label: &label,
                    next: labels,
                };
                let c = self.exec_stmt(inner, Some(&list))?;
                match c {
                    Completion::Break(Some(target)) if target == label => Ok(Completion::Normal),
                    other => Ok(other),
                }
            }
            StmtKind::Break(label) => Ok(Completion::Break(label.map(|s| self.sym(s)))),
            StmtKind::Continue(label) => Ok(Completion::Continue(label.map(|s| self.sym(s)))),
            StmtKind::With(object, body) => {
                let obj_val = self.eval_expr(object)?;
                let obj = to_object(&self.ctx, &obj_val)?;
                let with_env = new_object_env(obj, true, Some(self.env.clone()));
                let prev = std::mem::replace(&mut self.env, with_env);
                let result = self.exec_stmt(body, None);
                self.env = prev;
                result
            }
            StmtKind::Switch(discriminant, cases) => self.exec_switch(discriminant, cases, labels),
            StmtKind::Return(argument) => {
                let v = match argument {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Undefined,
                };
                Ok(Completion::Return(v))
            }
            StmtKind::Throw(argument) => {
                let v = self.eval_expr(argument)?;
                Err(JSError::Thrown(v))
            }
            StmtKind::Try { block, handler, finalizer } => self.exec_try(block, handler.as_ref(), finalizer.as_deref()),
            StmtKind::While(test, body) => {
                loop {
                    let t = self.eval_expr(test)?;
                    if !to_boolean(&t) {
                        break;
                    }
                    let c = self.exec_stmt(body, None)?;
                    match self.loop_flow(c, labels) {
                        LoopFlow::Next => {}
                        LoopFlow::Exit(comp) => return Ok(comp),
                    }
                }
                Ok(Completion::Normal)
            }
            StmtKind::DoWhile(body, test) => {
                loop {
                    let c = self.exec_stmt(body, None)?;
                    match self.loop_flow(c, labels) {
                        LoopFlow::Next => {}
                        LoopFlow::Exit(comp) => return Ok(comp),
                    }
                    let t = self.eval_expr(test)?;
                    if !to_boolean(&t) {
                        break;
                    }
                }
                Ok(Completion::Normal)
            }
            StmtKind::For { init, test, update, body } => {
                match init {
                    Some(ForInit::VarDecl(decls)) => self.exec_var_declarators(decls)?,
                    Some(ForInit::Expr(expr)) => {
                        self.eval_expr(expr)?;
                    }
                    None => {}
                }
                loop {
                    if let Some(test) = test {
                        let t = self.eval_expr(test)?;
                        if !to_boolean(&t) {
                            break;
                        }
                    }
                    let c = self.exec_stmt(body, None)?;
                    match self.loop_flow(c, labels) {
                        LoopFlow::Next => {}
                        LoopFlow::Exit(comp) => return Ok(comp),
                    }
                    if let Some(update) = update {
                        self.eval_expr(update)?;
                    }
                }
                Ok(Completion::Normal)
            }
            StmtKind::ForIn { left, right, body } => self.exec_for_in(left, right, body, labels),
            StmtKind::VarDecl(decls) => {
                self.exec_var_declarators(decls)?;
                Ok(Completion::Normal)
            }
        }
    }

    /// 12.6.3-style loop completion handling: a matching break exits the
    /// loop normally, a matching continue starts the next iteration, and
    /// everything else propagates.
    fn loop_flow(&self, c: Completion, labels: Option<&LabelList>) -> LoopFlow {
        match c {
            Completion::Normal => LoopFlow::Next,
            Completion::Break(target) => {
                if label_match(&target, labels) {
                    LoopFlow::Exit(Completion::Normal)
                } else {
                    LoopFlow::Exit(Completion::Break(target))
                }
            }
            Completion::Continue(target) => {
                if label_match(&target, labels) {
                    LoopFlow::Next
                } else {
                    LoopFlow::Exit(Completion::Continue(target))
                }
            }
            ret @ Completion::Return(_) => LoopFlow::Exit(ret),
        }
    }

    fn exec_var_declarators(&mut self, decls: &[VarDeclarator]) -> Result<(), JSError> {
        for decl in decls {
            if let Some(init) = &decl.init {
                let v = self.eval_expr(init)?;
                let name = self.sym(decl.id);
                self.resolve_and_put(&name, v)?;
            }
        }
        Ok(())
    }

    fn exec_switch(&mut self, discriminant: &Expr, cases: &[SwitchCase], labels: Option<&LabelList>) -> Result<Completion, JSError> {
        let d = self.eval_expr(discriminant)?;

        let mut selected = None;
        for (i, case) in cases.iter().enumerate() {
            if let Some(test) = &case.test {
                let t = self.eval_expr(test)?;
                if strict_equals(&t, &d) {
                    selected = Some(i);
                    break;
                }
            }
        }
        if selected.is_none() {
            selected = cases.iter().position(|c| c.test.is_none());
        }
        let Some(start) = selected else {
            return Ok(Completion::Normal);
        };

        for case in &cases[start..] {
            for s in &case.body {
                let c = self.exec_stmt(s, None)?;
                match c {
                    Completion::Normal => {}
                    Completion::Break(target) => {
                        return Ok(if label_match(&target, labels) {
                            Completion::Normal
                        } else {
                            Completion::Break(target)
                        });
                    }
                    other => return Ok(other),
                }
            }
        }
        Ok(Completion::Normal)
    }

    fn exec_try(&mut self, block: &Stmt, handler: Option<&CatchClause>, finalizer: Option<&Stmt>) -> Result<Completion, JSError> {
        let outcome = match self.exec_stmt(block, None) {
            Err(JSError::Thrown(exception)) => match handler {
                Some(clause) => {
                    // The catch parameter lives in its own declarative
                    // frame so it does not leak into the function scope.
                    let catch_env = new_declarative_env(Some(self.env.clone()));
                    let param = self.sym(clause.param);
                    env_create_binding(&self.ctx, &catch_env, &param, exception, false, false)?;
                    let prev = std::mem::replace(&mut self.env, catch_env);
                    let caught = self.exec_stmt(&clause.body, None);
                    self.env = prev;
                    caught
                }
                None => Err(JSError::Thrown(exception)),
            },
            other => other,
        };

        if let Some(fin) = finalizer {
            // A non-normal completion (or throw) from finally replaces the
            // pending outcome; a normal one preserves it.
            let fc = self.exec_stmt(fin, None)?;
            if !matches!(fc, Completion::Normal) {
                return Ok(fc);
            }
        }
        outcome
    }

    fn exec_for_in(&mut self, left: &ForInTarget, right: &Expr, body: &Stmt, labels: Option<&LabelList>) -> Result<Completion, JSError> {
        let v = self.eval_expr(right)?;
        if v.is_nullish() {
            return Ok(Completion::Normal);
        }
        let obj = to_object(&self.ctx, &v)?;
        // Snapshot the own enumerable names; inherited properties are
        // intentionally not iterated.
        let names: Vec<JSString> = obj
            .borrow()
            .props
            .iter()
            .filter(|(_, desc)| desc.enumerable)
            .map(|(k, _)| k.clone())
            .collect();

        for name in names {
            let val = Value::String(name);
            match left {
                ForInTarget::VarDecl(decls) => {
                    for decl in decls {
                        let id = self.sym(decl.id);
                        self.resolve_and_put(&id, val.clone())?;
                    }
                }
                ForInTarget::Expr(target) => match &target.kind {
                    ExprKind::Identifier(sym) => {
                        let id = self.sym(*sym);
                        self.resolve_and_put(&id, val.clone())?;
                    }
                    ExprKind::Member { object, property } => {
                        let (base, prop) = self.eval_member_ref(object, property)?;
                        let base_obj = to_object(&self.ctx, &base)?;
                        obj_put(&self.ctx, &base_obj, &prop, val.clone(), self.strict)?;
                    }
                    _ => return Err(throw_reference_error(&self.ctx, "invalid for-in loop target")),
                },
            }
            let c = self.exec_stmt(body, None)?;
            match self.loop_flow(c, labels) {
                LoopFlow::Next => {}
                LoopFlow::Exit(comp) => return Ok(comp),
            }
        }
        Ok(Completion::Normal)
    }

    // ── Expressions ─────────────────────────────────────────────────────

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value, JSError> {
        match &expr.kind {
            ExprKind::This => Ok(self.this_val.clone()),
            ExprKind::Null => Ok(Value::Null),
            ExprKind::Boolean(b) => Ok(Value::Boolean(*b)),
            ExprKind::Number(n) => Ok(Value::int_or_number(*n)),
            ExprKind::StringLit(sym) => Ok(Value::String(self.sym(*sym))),
            ExprKind::RegExpLit { pattern, flags } => {
                let pattern = self.sym(*pattern);
                let flags = self.sym(*flags);
                Ok(Value::Object(crate::js_regexp::new_regexp_object(&self.ctx, &pattern, &flags)?))
            }
            ExprKind::Identifier(sym) => {
                let name = self.sym(*sym);
                match self.resolve(&name)? {
                    Some((_, v)) => Ok(v),
                    None => Err(throw_reference_error(&self.ctx, &format!("{name} is not defined"))),
                }
            }
            ExprKind::Array(elements) => {
                let arr = new_array(&self.ctx, &[]);
                for (i, element) in elements.iter().enumerate() {
                    if let Some(e) = element {
                        let v = self.eval_expr(e)?;
                        obj_put(&self.ctx, &arr, &index_string(i as u32), v, false)?;
                    }
                }
                obj_put(
                    &self.ctx,
                    &arr,
                    &JSString::intern("length"),
                    Value::int_or_number(elements.len() as f64),
                    false,
                )?;
                Ok(Value::Object(arr))
            }
            ExprKind::Object(properties) => {
                let obj = new_object(Some(self.ctx.object_proto()));
                for prop in properties {
                    let name = self.sym(prop.key);
                    let v = self.eval_expr(&prop.value)?;
                    match prop.kind {
                        PropKind::Init => obj_put(&self.ctx, &obj, &name, v, false)?,
                        PropKind::Get => define_accessor_property(&obj, &name, Some(v), None),
                        PropKind::Set => define_accessor_property(&obj, &name, None, Some(v)),
                    }
                }
                Ok(Value::Object(obj))
            }
            ExprKind::Function(node) => self.new_function_object(node),
            ExprKind::Sequence(exprs) => {
                let mut last = Value::Undefined;
                for e in exprs {
                    last = self.eval_expr(e)?;
                }
                Ok(last)
            }
            ExprKind::Unary(op, arg) => self.eval_unary(*op, arg),
            ExprKind::Binary(op, left, right) => {
                let lval = self.eval_expr(left)?;
                let rval = self.eval_expr(right)?;
                self.eval_binary(*op, lval, rval)
            }
            ExprKind::Logical(op, left, right) => {
                let lval = self.eval_expr(left)?;
                let short_circuit = match op {
                    LogicalOp::And => !to_boolean(&lval),
                    LogicalOp::Or => to_boolean(&lval),
                };
                if short_circuit {
                    return Ok(lval);
                }
                self.eval_expr(right)
            }
            ExprKind::Conditional(test, consequent, alternate) => {
                let t = self.eval_expr(test)?;
                if to_boolean(&t) {
                    self.eval_expr(consequent)
                } else {
                    self.eval_expr(alternate)
                }
            }
            ExprKind::Assign(op, left, right) => self.eval_assignment(*op, left, right),
            ExprKind::Update { op, prefix, arg } => self.eval_update(*op, *prefix, arg),
            ExprKind::New(callee, arguments) => {
                let func = self.eval_expr(callee)?;
                let fobj = match &func {
                    Value::Object(o) if is_callable(&func) => o.clone(),
                    _ => return Err(throw_type_error(&self.ctx, &format!("{} is not a constructor", type_of(&func)))),
                };
                let mut args = Vec::with_capacity(arguments.len());
                for a in arguments {
                    args.push(self.eval_expr(a)?);
                }
                obj_construct(&self.ctx, &fobj, &args)
            }
            ExprKind::Call(callee, arguments) => self.eval_call(callee, arguments),
            ExprKind::Member { object, property } => {
                let (base, name) = self.eval_member_ref(object, property)?;
                let base_obj = to_object(&self.ctx, &base)?;
                obj_get(&self.ctx, &base_obj, &name)
            }
        }
    }

    /// 11.2.1: evaluates a member expression down to (base value, name).
    fn eval_member_ref(&mut self, object: &Expr, property: &MemberKey) -> Result<(Value, JSString), JSError> {
        let base = self.eval_expr(object)?;
        let name = match property {
            MemberKey::Name(sym) => self.sym(*sym),
            MemberKey::Computed(expr) => {
                let v = self.eval_expr(expr)?;
                to_string(&self.ctx, &v)?
            }
        };
        check_object_coercible(&self.ctx, &base)?;
        Ok((base, name))
    }

    fn eval_unary(&mut self, op: UnaryOp, arg: &Expr) -> Result<Value, JSError> {
        match op {
            UnaryOp::Delete => match &arg.kind {
                ExprKind::Identifier(sym) => {
                    let name = self.sym(*sym);
                    let env = self.env.clone();
                    Ok(Value::Boolean(env_delete_binding(&self.ctx, &env, &name)?))
                }
                ExprKind::Member { object, property } => {
                    let (base, name) = self.eval_member_ref(object, property)?;
                    let obj = to_object(&self.ctx, &base)?;
                    Ok(Value::Boolean(obj_delete(&self.ctx, &obj, &name, self.strict)?))
                }
                _ => Err(throw_reference_error(&self.ctx, "invalid delete target")),
            },
            UnaryOp::TypeOf => {
                // Unresolvable identifiers answer "undefined" instead of
                // throwing.
                if let ExprKind::Identifier(sym) = &arg.kind {
                    let name = self.sym(*sym);
                    return Ok(Value::String(JSString::intern(match self.resolve(&name)? {
                        Some((_, v)) => type_of(&v),
                        None => "undefined",
                    })));
                }
                let v = self.eval_expr(arg)?;
                Ok(Value::String(JSString::intern(type_of(&v))))
            }
            UnaryOp::Void => {
                self.eval_expr(arg)?;
                Ok(Value::Undefined)
            }
            UnaryOp::Plus => {
                let v = self.eval_expr(arg)?;
                Ok(Value::int_or_number(to_number(&self.ctx, &v)?))
            }
            UnaryOp::Minus => {
                let v = self.eval_expr(arg)?;
                Ok(Value::int_or_number(-to_number(&self.ctx, &v)?))
            }
            UnaryOp::BitNot => {
                let v = self.eval_expr(arg)?;
                let n = to_number(&self.ctx, &v)?;
                Ok(Value::Integer(!f64_to_int32(n)))
            }
            UnaryOp::Not => {
                let v = self.eval_expr(arg)?;
                Ok(Value::Boolean(!to_boolean(&v)))
            }
        }
    }

    fn eval_binary(&mut self, op: BinaryOp, lval: Value, rval: Value) -> Result<Value, JSError> {
        match op {
            BinaryOp::StrictEq => Ok(Value::Boolean(strict_equals(&lval, &rval))),
            BinaryOp::StrictNotEq => Ok(Value::Boolean(!strict_equals(&lval, &rval))),
            BinaryOp::Eq => Ok(Value::Boolean(abstract_equals(&self.ctx, &lval, &rval)?)),
            BinaryOp::NotEq => Ok(Value::Boolean(!abstract_equals(&self.ctx, &lval, &rval)?)),
            BinaryOp::InstanceOf => self.eval_instanceof(&lval, &rval),
            BinaryOp::In => {
                let name = to_string(&self.ctx, &lval)?;
                let Value::Object(robj) = &rval else {
                    return Err(throw_type_error(&self.ctx, "'in' requires an object"));
                };
                Ok(Value::Boolean(get_property(robj, &name).is_some()))
            }
            _ => self.numeric_binary(op, &lval, &rval),
        }
    }

    /// 11.8.6: walks the LHS prototype chain looking for the RHS function's
    /// `prototype` object.
    fn eval_instanceof(&mut self, lval: &Value, rval: &Value) -> Result<Value, JSError> {
        let robj = match rval {
            Value::Object(o) if is_callable(rval) => o.clone(),
            _ => return Err(throw_type_error(&self.ctx, "right-hand side of 'instanceof' is not callable")),
        };
        let proto_val = obj_get(&self.ctx, &robj, &JSString::intern("prototype"))?;
        let Some(rproto) = proto_val.as_object() else {
            return Err(throw_type_error(&self.ctx, "function has no prototype object"));
        };
        let lobj = to_object(&self.ctx, lval)?;
        let mut proto = lobj.borrow().proto.clone();
        while let Some(p) = proto {
            if Rc::ptr_eq(&p, rproto) {
                return Ok(Value::Boolean(true));
            }
            proto = p.borrow().proto.clone();
        }
        Ok(Value::Boolean(false))
    }

    /// The numeric/concatenation ladder shared by binary operators and
    /// compound assignment: ToPrimitive both sides, `+` concatenates when
    /// either side is a string, everything else runs on numbers.
    fn numeric_binary(&mut self, op: BinaryOp, lval: &Value, rval: &Value) -> Result<Value, JSError> {
        use BinaryOp::*;
        let lp = to_primitive(&self.ctx, lval, Hint::None)?;
        let rp = to_primitive(&self.ctx, rval, Hint::None)?;

        if op == Add && (lp.is_string() || rp.is_string()) {
            let ls = to_string(&self.ctx, &lp)?;
            let rs = to_string(&self.ctx, &rp)?;
            return Ok(Value::String(ls.concat(&rs)));
        }

        let ln = to_number(&self.ctx, &lp)?;
        let rn = to_number(&self.ctx, &rp)?;
        Ok(match op {
            Add => Value::int_or_number(ln + rn),
            Sub => Value::int_or_number(ln - rn),
            Mul => Value::int_or_number(ln * rn),
            Div => Value::int_or_number(ln / rn),
            Mod => Value::int_or_number(ln % rn),
            Shl => Value::Integer(f64_to_int32(ln) << (f64_to_uint32(rn) & 31)),
            Shr => Value::Integer(f64_to_int32(ln) >> (f64_to_uint32(rn) & 31)),
            UShr => Value::int_or_number((f64_to_uint32(ln) >> (f64_to_uint32(rn) & 31)) as f64),
            Lt => Value::Boolean(ln < rn),
            Gt => Value::Boolean(ln > rn),
            Le => Value::Boolean(ln <= rn),
            Ge => Value::Boolean(ln >= rn),
            BitAnd => Value::Integer(f64_to_int32(ln) & f64_to_int32(rn)),
            BitXor => Value::Integer(f64_to_int32(ln) ^ f64_to_int32(rn)),
            BitOr => Value::Integer(f64_to_int32(ln) | f64_to_int32(rn)),
            Eq | NotEq | StrictEq | StrictNotEq | In | InstanceOf => unreachable!("handled in eval_binary"),
        })
    }

    fn eval_assignment(&mut self, op: Option<BinaryOp>, left: &Expr, right: &Expr) -> Result<Value, JSError> {
        match &left.kind {
            ExprKind::Identifier(sym) => {
                let name = self.sym(*sym);
                match op {
                    None => {
                        let rval = self.eval_expr(right)?;
                        self.resolve_and_put(&name, rval.clone())?;
                        Ok(rval)
                    }
                    Some(bin_op) => {
                        let Some((env, lval)) = self.resolve(&name)? else {
                            return Err(throw_reference_error(&self.ctx, &format!("{name} is not defined")));
                        };
                        let rval = self.eval_expr(right)?;
                        let v = self.numeric_binary(bin_op, &lval, &rval)?;
                        self.put_value_with_env(&env, &name, v.clone())?;
                        Ok(v)
                    }
                }
            }
            ExprKind::Member { object, property } => {
                let (base, name) = self.eval_member_ref(object, property)?;
                let base_obj = to_object(&self.ctx, &base)?;
                let v = match op {
                    None => self.eval_expr(right)?,
                    Some(bin_op) => {
                        let lval = obj_get(&self.ctx, &base_obj, &name)?;
                        let rval = self.eval_expr(right)?;
                        self.numeric_binary(bin_op, &lval, &rval)?
                    }
                };
                obj_put(&self.ctx, &base_obj, &name, v.clone(), self.strict)?;
                Ok(v)
            }
            _ => Err(throw_reference_error(&self.ctx, "invalid assignment target")),
        }
    }

    fn eval_update(&mut self, op: UpdateOp, prefix: bool, arg: &Expr) -> Result<Value, JSError> {
        let delta = match op {
            UpdateOp::Increment => 1.0,
            UpdateOp::Decrement => -1.0,
        };
        match &arg.kind {
            ExprKind::Identifier(sym) => {
                let name = self.sym(*sym);
                let Some((env, old)) = self.resolve(&name)? else {
                    return Err(throw_reference_error(&self.ctx, &format!("{name} is not defined")));
                };
                let old_num = to_number(&self.ctx, &old)?;
                let new_val = Value::int_or_number(old_num + delta);
                self.put_value_with_env(&env, &name, new_val.clone())?;
                Ok(if prefix { new_val } else { Value::int_or_number(old_num) })
            }
            ExprKind::Member { object, property } => {
                let (base, name) = self.eval_member_ref(object, property)?;
                let base_obj = to_object(&self.ctx, &base)?;
                let old = obj_get(&self.ctx, &base_obj, &name)?;
                let old_num = to_number(&self.ctx, &old)?;
                let new_val = Value::int_or_number(old_num + delta);
                obj_put(&self.ctx, &base_obj, &name, new_val.clone(), self.strict)?;
                Ok(if prefix { new_val } else { Value::int_or_number(old_num) })
            }
            _ => Err(throw_reference_error(&self.ctx, "invalid increment/decrement target")),
        }
    }

    /// 11.2.3: the `this` binding comes from the member base, from an
    /// object environment with `provide_this`, or defaults to undefined
    /// (coerced to the global object later for non-strict callees).
    fn eval_call(&mut self, callee: &Expr, arguments: &[Expr]) -> Result<Value, JSError> {
        let (func, this_val) = match &callee.kind {
            ExprKind::Identifier(sym) => {
                let name = self.sym(*sym);
                let Some((env, func)) = self.resolve(&name)? else {
                    return Err(throw_reference_error(&self.ctx, &format!("{name} is not defined")));
                };
                let this_val = match &env.borrow().kind {
                    EnvKind::Object {
                        bindings,
                        provide_this: true,
                    } => Value::Object(bindings.clone()),
                    _ => Value::Undefined,
                };
                (func, this_val)
            }
            ExprKind::Member { object, property } => {
                let (base, name) = self.eval_member_ref(object, property)?;
                let base_obj = to_object(&self.ctx, &base)?;
                let func = obj_get(&self.ctx, &base_obj, &name)?;
                (func, base)
            }
            _ => (self.eval_expr(callee)?, Value::Undefined),
        };

        let fobj = match &func {
            Value::Object(o) if is_callable(&func) => o.clone(),
            _ => return Err(throw_type_error(&self.ctx, &format!("{} is not a function", type_of(&func)))),
        };

        let mut args = Vec::with_capacity(arguments.len());
        for a in arguments {
            args.push(self.eval_expr(a)?);
        }
        obj_call(&self.ctx, &fobj, this_val, &args)
    }

    /// 13.2: creates a function object closing over the current
    /// environment, with a fresh `prototype` whose `constructor` points
    /// back at the function.
    fn new_function_object(&mut self, node: &Rc<FunctionNode>) -> Result<Value, JSError> {
        let obj = new_object(Some(self.ctx.function_proto()));
        obj.borrow_mut().data = ObjectData::Function(Rc::new(FunctionData {
            name: node.id.map(|s| self.sym(s)),
            kind: FunctionKind::Script(Rc::new(ScriptFunction {
                code: node.clone(),
                scope: self.env.clone(),
                script: self.script.clone(),
                strict: false,
            })),
        }));

        let proto = new_object(Some(self.ctx.object_proto()));
        obj_put(&self.ctx, &obj, &JSString::intern("prototype"), Value::Object(proto.clone()), false)?;
        obj_put(&self.ctx, &proto, &JSString::intern("constructor"), Value::Object(obj.clone()), false)?;
        Ok(Value::Object(obj))
    }
}
