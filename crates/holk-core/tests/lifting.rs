use holk_core::logic::{mk_all, mk_eq, mk_ex, mk_imp, mk_imps};
use holk_core::{Const, Head, KCChain, KernelContext, KernelError, Term, Theorem, Var};
use pretty_assertions::assert_eq;

fn var(name: &str) -> Var {
    Var::parse(name).unwrap()
}

fn leaf(name: &str) -> Term {
    Term::leaf(var(name))
}

fn konst(name: &str) -> Const {
    Const::parse(name).unwrap()
}

fn atom(name: &str) -> Term {
    Term::atom(konst(name))
}

fn never(_: &KernelContext, _: &Term) -> Option<Theorem> {
    None
}

type Step = Box<dyn Fn(&KernelContext) -> KernelContext>;

/// Build a chain by applying each step to the last context.
fn chain(steps: Vec<Step>) -> KCChain {
    steps.iter().fold(KCChain::new(KernelContext::root()), |chain, step| {
        let next = step(chain.last());
        chain.append(next).unwrap()
    })
}

fn assume(term: Term) -> Step {
    Box::new(move |kc| kc.assume(term.clone()).unwrap())
}

fn declare(head: Head) -> Step {
    Box::new(move |kc| kc.declare(head.clone()).unwrap())
}

fn define(name: &'static str, hyps: Vec<Term>, body: Term) -> Step {
    Box::new(move |kc| kc.define(&konst(name), hyps.clone(), body.clone(), &never).unwrap())
}

fn seal(name: &'static str) -> Step {
    Box::new(move |kc| kc.seal(&konst(name)).unwrap())
}

fn last_axiom(chain: &KCChain) -> Theorem {
    let kc = chain.last();
    kc.axiom(kc.axioms().len() - 1).unwrap()
}

#[test]
fn forward_then_backward_is_exact() {
    let _ = pretty_env_logger::try_init();

    let chain = chain(vec![
        assume(mk_eq(leaf("x"), leaf("y"))),
        declare(Head::nullary(konst("zero"))),
        assume(mk_eq(atom("zero"), atom("zero"))),
    ]);
    let thm = chain.get(1).unwrap().axiom(0).unwrap();

    let forward = chain.lift(&thm, 1, 3).unwrap();
    assert!(chain.last().is_valid(&forward));
    assert_eq!(forward.prop(), thm.prop());

    let back = chain.lift(&forward, 3, 1).unwrap();
    assert!(chain.get(1).unwrap().is_valid(&back));
    assert_eq!(back.prop(), thm.prop());

    // a point between the origin and the current context needs no replay
    let middle = chain.lift(&forward, 3, 2).unwrap();
    assert_eq!(middle.prop(), thm.prop());
}

#[test]
fn lifting_past_an_assumption() {
    let chain = chain(vec![assume(mk_eq(leaf("x"), leaf("y")))]);
    let thm = last_axiom(&chain);

    let lifted = chain.lift(&thm, 1, 0).unwrap();
    let root = chain.get(0).unwrap();
    let expected = mk_imp(
        mk_all(var("x"), mk_all(var("y"), mk_eq(leaf("x"), leaf("y")))),
        mk_eq(leaf("x"), leaf("y")),
    );

    assert!(root.is_valid(&lifted));
    assert!(root.alpha_equivalent(lifted.prop(), &expected));
}

#[test]
fn lifting_past_definitions_schematizes_constants() {
    let chain = chain(vec![
        declare(Head::nullary(konst("zero"))),
        declare(Head::nullary(konst("one"))),
        define("one", vec![], atom("zero")),
    ]);
    let thm = last_axiom(&chain);
    assert_eq!(thm.prop(), &mk_eq(atom("one"), atom("zero")));

    let lifted = chain.lift(&thm, 3, 0).unwrap();
    let expected = mk_imp(
        mk_eq(leaf("one"), leaf("zero")),
        mk_eq(leaf("one"), leaf("zero")),
    );
    assert_eq!(lifted.prop(), &expected);

    // zero stays a constant when it is still declared
    let lifted = chain.lift(&thm, 3, 1).unwrap();
    let expected = mk_imp(
        mk_eq(leaf("one"), atom("zero")),
        mk_eq(leaf("one"), atom("zero")),
    );
    assert_eq!(lifted.prop(), &expected);
}

#[test]
fn lifting_past_a_parametrized_definition() {
    let f = konst("f");
    let f_a = Term::constant(f.clone(), vec![], vec![leaf("A")]);
    let chain = chain(vec![
        declare(Head::new(f, vec![], vec![leaf("A")]).unwrap()),
        define("f", vec![], leaf("A")),
    ]);
    let thm = last_axiom(&chain);

    let lifted = chain.lift(&thm, 2, 1).unwrap();
    let expected = mk_imp(
        mk_all(var("A"), mk_eq(f_a.clone(), leaf("A"))),
        mk_eq(f_a, leaf("A")),
    );
    assert!(chain.get(1).unwrap().alpha_equivalent(lifted.prop(), &expected));

    let lifted = chain.lift(&thm, 2, 0).unwrap();
    let f_a = Term::var(var("f"), vec![leaf("A")]);
    let expected = mk_imp(
        mk_all(var("A"), mk_eq(f_a.clone(), leaf("A"))),
        mk_eq(f_a, leaf("A")),
    );
    assert!(chain.get(0).unwrap().alpha_equivalent(lifted.prop(), &expected));
}

#[test]
fn lifting_past_a_choice() {
    let exists = mk_ex(var("x"), mk_eq(leaf("x"), leaf("x")));
    let base = chain(vec![assume(exists.clone())]);
    let kc = base.last();
    let chosen = kc.choose(konst("w"), &kc.axiom(0).unwrap()).unwrap();
    let chain = base.append(chosen).unwrap();

    let thm = last_axiom(&chain);
    assert_eq!(thm.prop(), &mk_eq(atom("w"), atom("w")));

    let lifted = chain.lift(&thm, 2, 1).unwrap();
    assert!(chain.get(1).unwrap().alpha_equivalent(lifted.prop(), &exists));

    let lifted = chain.lift(&thm, 2, 0).unwrap();
    assert!(chain
        .get(0)
        .unwrap()
        .alpha_equivalent(lifted.prop(), &mk_imp(exists.clone(), exists)));
}

#[test]
fn sealed_definitions_are_skipped_when_unused() {
    let chain = chain(vec![
        declare(Head::nullary(konst("zero"))),
        declare(Head::nullary(konst("c"))),
        define("c", vec![], atom("zero")),
        seal("c"),
        assume(mk_eq(atom("zero"), atom("zero"))),
    ]);
    let thm = last_axiom(&chain);

    let lifted = chain.lift(&thm, 5, 1).unwrap();
    let zero_eq = mk_eq(atom("zero"), atom("zero"));
    assert_eq!(lifted.prop(), &mk_imp(zero_eq.clone(), zero_eq));
}

#[test]
fn sealed_definitions_are_kept_when_mentioned_earlier() {
    let chain = chain(vec![
        declare(Head::nullary(konst("zero"))),
        declare(Head::nullary(konst("one"))),
        declare(Head::nullary(konst("c"))),
        assume(mk_eq(atom("c"), atom("one"))),
        define("c", vec![], atom("zero")),
        seal("c"),
        assume(mk_eq(atom("zero"), atom("zero"))),
    ]);
    let thm = last_axiom(&chain);

    let lifted = chain.lift(&thm, 7, 2).unwrap();
    let zero_eq = mk_eq(atom("zero"), atom("zero"));
    let expected = mk_imps(
        vec![
            mk_eq(leaf("c"), atom("one")),
            mk_eq(leaf("c"), atom("zero")),
            zero_eq.clone(),
        ],
        zero_eq,
    );
    assert_eq!(lifted.prop(), &expected);
}

#[test]
fn constants_with_binders_can_not_be_lifted() {
    let sum = konst("sum");
    let head = Head::new(
        sum.clone(),
        vec![var("i")],
        vec![Term::var(var("F"), vec![leaf("i")])],
    )
    .unwrap();
    let sum_term = Term::constant(sum.clone(), vec![var("i")], vec![leaf("i")]);
    let chain = chain(vec![declare(head), assume(mk_eq(sum_term.clone(), sum_term))]);
    let thm = last_axiom(&chain);

    assert!(chain.lift(&thm, 2, 1).is_ok());
    assert_eq!(chain.lift(&thm, 2, 0), Err(KernelError::CannotLiftBinders(sum)));
}

#[test]
fn declarations_with_binders_block_lifting_even_when_unused() {
    let sum = konst("sum");
    let head = Head::new(
        sum.clone(),
        vec![var("i")],
        vec![Term::var(var("F"), vec![leaf("i")])],
    )
    .unwrap();
    let chain = chain(vec![declare(head), assume(mk_eq(leaf("a"), leaf("a")))]);
    let thm = last_axiom(&chain);

    assert!(chain.lift(&thm, 2, 1).is_ok());
    assert_eq!(chain.lift(&thm, 2, 0), Err(KernelError::CannotLiftBinders(sum)));
}

#[test]
fn parametrized_assumptions_can_not_be_lifted() {
    let chain = chain(vec![
        assume(mk_eq(Term::var(var("F"), vec![leaf("a")]), leaf("a"))),
        assume(mk_eq(leaf("b"), leaf("b"))),
    ]);
    let thm = last_axiom(&chain);

    assert!(chain.lift(&thm, 2, 1).is_ok());
    assert!(matches!(
        chain.lift(&thm, 2, 0),
        Err(KernelError::CannotLiftAssumption(_))
    ));
}

#[test]
fn joins_start_new_chains() {
    let root = KernelContext::root();
    let left = root.assume(mk_eq(leaf("x"), leaf("x"))).unwrap();
    let right = root.declare(Head::nullary(konst("zero"))).unwrap();
    let joined = KernelContext::join(&[left.clone(), right]).unwrap();

    let chain = KCChain::new(left);
    assert_eq!(chain.append(joined.clone()).unwrap_err(), KernelError::NotAChild);

    // the join itself is never replayed from a chain starting at it
    let next = joined.assume(mk_eq(atom("zero"), atom("zero"))).unwrap();
    let chain = KCChain::new(joined).append(next).unwrap();
    let thm = last_axiom(&chain);
    assert!(chain.lift(&thm, 1, 0).is_ok());
}

#[test]
fn squashed_chains_still_lift() {
    let full = chain(vec![
        assume(mk_eq(leaf("x"), leaf("x"))),
        declare(Head::nullary(konst("zero"))),
        assume(mk_eq(atom("zero"), atom("zero"))),
    ]);
    let squashed = full.squash(0, 3).unwrap();
    assert_eq!(squashed.len(), 2);

    let thm = last_axiom(&squashed);
    let lifted = squashed.lift(&thm, 1, 0).unwrap();
    let zero_eq = mk_eq(leaf("zero"), leaf("zero"));
    assert!(squashed.get(0).unwrap().alpha_equivalent(
        lifted.prop(),
        &mk_imp(
            mk_all(var("x"), mk_eq(leaf("x"), leaf("x"))),
            mk_imp(zero_eq.clone(), zero_eq),
        ),
    ));
}

#[test]
fn lifting_forward_across_a_squashed_origin() {
    let full = chain(vec![
        assume(mk_eq(leaf("x"), leaf("x"))),
        declare(Head::nullary(konst("zero"))),
        assume(mk_eq(atom("zero"), atom("zero"))),
    ]);
    let thm = full.get(1).unwrap().axiom(0).unwrap();
    let thm = full.lift(&thm, 1, 2).unwrap();

    // the context the theorem was first established in is gone
    let squashed = full.squash(0, 2).unwrap();
    assert_eq!(squashed.len(), 3);
    assert_eq!(squashed.position(thm.origin()), None);

    let lifted = squashed.lift(&thm, 1, 2).unwrap();
    assert_eq!(lifted.prop(), thm.prop());
    assert!(squashed.get(2).unwrap().is_valid(&lifted));
}

#[test]
fn out_of_range_indices() {
    let chain = chain(vec![assume(mk_eq(leaf("x"), leaf("x")))]);
    let thm = last_axiom(&chain);

    assert_eq!(chain.lift(&thm, 1, 5), Err(KernelError::ContextOutOfRange(5)));
    assert_eq!(chain.lift(&thm, 7, 0), Err(KernelError::ContextOutOfRange(7)));
}
