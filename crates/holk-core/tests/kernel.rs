use holk_core::logic::{mk_all, mk_eq, mk_ex, mk_imp, mk_imps};
use holk_core::{
    Const, Head, KCChain, KernelContext, KernelError, Term, Theorem, Tm, TmSubstitution,
    TmWithHoles, Var,
};
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

/// A prover that only knows the axioms of the context.
fn by_axiom(context: &KernelContext, obligation: &Term) -> Option<Theorem> {
    let index = context
        .axioms()
        .iter()
        .position(|axiom| context.alpha_equivalent(axiom, obligation))?;
    context.axiom(index).ok()
}

fn never(_: &KernelContext, _: &Term) -> Option<Theorem> {
    None
}

#[test]
fn modus_ponens_twice() {
    let _ = pretty_env_logger::try_init();

    let kc = KernelContext::root()
        .assume(mk_eq(leaf("x"), leaf("y")))
        .unwrap()
        .assume(mk_imps(
            vec![mk_eq(leaf("x"), leaf("y")), mk_eq(leaf("x"), leaf("x"))],
            mk_eq(leaf("y"), leaf("x")),
        ))
        .unwrap()
        .assume(mk_eq(leaf("x"), leaf("x")))
        .unwrap();

    let step = kc.modus_ponens(&kc.axiom(0).unwrap(), &kc.axiom(1).unwrap()).unwrap();
    let result = kc.modus_ponens(&kc.axiom(2).unwrap(), &step).unwrap();

    assert!(kc.alpha_equivalent(result.prop(), &mk_eq(leaf("y"), leaf("x"))));
    assert!(kc.is_valid(&result));
}

#[test]
fn modus_ponens_checks_the_antecedent() {
    let kc = KernelContext::root()
        .assume(mk_eq(leaf("x"), leaf("y")))
        .unwrap()
        .assume(mk_imp(mk_eq(leaf("y"), leaf("x")), mk_eq(leaf("x"), leaf("x"))))
        .unwrap();

    assert_eq!(
        kc.modus_ponens(&kc.axiom(0).unwrap(), &kc.axiom(1).unwrap()),
        Err(KernelError::AntecedentMismatch {
            expected: mk_eq(leaf("y"), leaf("x")),
            found: mk_eq(leaf("x"), leaf("y")),
        }),
    );
    assert_eq!(
        kc.modus_ponens(&kc.axiom(1).unwrap(), &kc.axiom(0).unwrap()),
        Err(KernelError::NotAnImplication(mk_eq(leaf("x"), leaf("y")))),
    );
}

#[test]
fn modus_ponens_up_to_alpha_equivalence() {
    let forall = |name: &str| mk_all(var(name), mk_eq(leaf(name), leaf(name)));
    let kc = KernelContext::root()
        .assume(forall("x"))
        .unwrap()
        .assume(mk_imp(forall("y"), mk_eq(leaf("a"), leaf("a"))))
        .unwrap();

    let thm = kc.modus_ponens(&kc.axiom(0).unwrap(), &kc.axiom(1).unwrap()).unwrap();
    assert_eq!(thm.prop(), &mk_eq(leaf("a"), leaf("a")));
}

#[test]
fn axioms_are_tagged_with_their_context() {
    let root = KernelContext::root();
    let kc = root.assume(mk_eq(leaf("x"), leaf("x"))).unwrap();
    let thm = kc.axiom(kc.axioms().len() - 1).unwrap();

    assert_eq!(thm.prop(), &mk_eq(leaf("x"), leaf("x")));
    assert_eq!(thm.context(), kc.uuid());
    assert!(kc.is_valid(&thm));
    assert!(!root.is_valid(&thm));
    assert_eq!(kc.axiom(1), Err(KernelError::AxiomOutOfRange(1)));
}

#[test]
fn theorems_from_other_contexts_are_rejected() {
    let root = KernelContext::root();
    let first = root.assume(mk_eq(leaf("x"), leaf("x"))).unwrap();
    let kc = first
        .assume(mk_imp(mk_eq(leaf("x"), leaf("x")), mk_ex(var("z"), mk_eq(leaf("z"), leaf("z")))))
        .unwrap();
    let other = kc.assume(mk_eq(leaf("y"), leaf("y"))).unwrap();

    let hyp = kc.axiom(0).unwrap();
    let imp = kc.axiom(1).unwrap();
    let foreign = KernelError::InvalidTheorem(hyp.prop().clone());

    assert_eq!(other.modus_ponens(&hyp, &other.axiom(1).unwrap()), Err(foreign.clone()));
    assert_eq!(other.all_intro(var("x"), &hyp), Err(foreign.clone()));
    assert_eq!(other.substitute(&hyp, &TmSubstitution::new()), Err(foreign.clone()));

    let exists = kc.modus_ponens(&hyp, &imp).unwrap();
    assert_eq!(
        other.choose(konst("w"), &exists).unwrap_err(),
        KernelError::InvalidTheorem(exists.prop().clone()),
    );

    let chain = KCChain::new(root)
        .append(first)
        .unwrap()
        .append(kc.clone())
        .unwrap();
    assert_eq!(chain.lift(&hyp, 1, 2), Err(foreign));
    assert!(chain.lift(&hyp, 2, 0).is_ok());
}

#[test]
fn all_intro_generalizes() {
    let kc = KernelContext::root().assume(mk_eq(leaf("x"), leaf("x"))).unwrap();
    let thm = kc.all_intro(var("x"), &kc.axiom(0).unwrap()).unwrap();

    assert_eq!(thm.prop(), &mk_all(var("x"), mk_eq(leaf("x"), leaf("x"))));
    assert!(kc.tm(thm.prop()).unwrap().free_vars().is_empty());
}

#[test]
fn all_intro_rejects_ill_formed_results() {
    let kc = KernelContext::root()
        .assume(mk_eq(Term::var(var("F"), vec![leaf("a")]), leaf("a")))
        .unwrap();

    // `F` would become a bound variable with parameters
    assert!(kc.all_intro(var("F"), &kc.axiom(0).unwrap()).is_err());
}

#[test]
fn assume_rejects_ill_formed_terms() {
    let root = KernelContext::root();

    assert!(root.assume(atom("zero")).is_err());
    assert!(root
        .assume(mk_eq(leaf("F"), Term::var(var("F"), vec![leaf("a")])))
        .is_err());
    assert!(root
        .assume(Term::constant(konst("eq"), vec![var("x")], vec![leaf("x"), leaf("x")]))
        .is_err());
}

#[test]
fn substitute_instantiates_schematic_variables() {
    let kc = KernelContext::root()
        .assume(mk_all(var("x"), Term::var(var("P"), vec![leaf("x")])))
        .unwrap();
    let thm = kc.axiom(0).unwrap();

    // P ↦ [y] y = a
    let image = kc
        .tm_with_holes(&holk_core::TermWithHoles::new(
            vec![var("y")],
            mk_eq(leaf("y"), leaf("a")),
        ))
        .unwrap();
    let subst = TmSubstitution::single(var("P"), image);
    let instance = kc.substitute(&thm, &subst).unwrap();

    assert!(kc.alpha_equivalent(
        instance.prop(),
        &mk_all(var("x"), mk_eq(leaf("x"), leaf("a"))),
    ));
}

#[test]
fn substitute_checks_images() {
    let kc = KernelContext::root()
        .assume(Term::var(var("P"), vec![leaf("a")]))
        .unwrap();
    let thm = kc.axiom(0).unwrap();

    let wrong_arity = TmSubstitution::single(var("P"), TmWithHoles::closed(Tm::Free(var("b"), vec![])));
    assert_eq!(
        kc.substitute(&thm, &wrong_arity),
        Err(KernelError::SubstitutionArity(var("P"))),
    );

    let dangling = TmSubstitution::single(var("P"), TmWithHoles::new(1, Tm::Bound(1)));
    assert_eq!(
        kc.substitute(&thm, &dangling),
        Err(KernelError::SubstitutionNotClosed(var("P"))),
    );

    let bound = TmSubstitution::new().with_bound(0, Tm::Free(var("b"), vec![]));
    assert_eq!(kc.substitute(&thm, &bound), Err(KernelError::SubstitutionOfBound));

    let unknown = TmSubstitution::single(
        var("P"),
        TmWithHoles::new(1, Tm::Const(konst("zero"), vec![], vec![])),
    );
    assert!(kc.substitute(&thm, &unknown).is_err());
}

#[test]
fn extensions_only_grow() {
    let _ = pretty_env_logger::try_init();

    let root = KernelContext::root();
    let zero = konst("zero");
    let f = konst("f");
    let f_head = Head::new(f.clone(), vec![], vec![leaf("A")]).unwrap();

    let mut contexts = vec![root.clone()];
    let kc = root.declare(Head::nullary(zero.clone())).unwrap();
    contexts.push(kc.clone());
    let kc = kc.declare(f_head).unwrap();
    contexts.push(kc.clone());
    let kc = kc.define(&f, vec![], atom("zero"), &never).unwrap();
    contexts.push(kc.clone());
    let kc = kc.seal(&f).unwrap();
    contexts.push(kc.clone());
    let kc = kc.assume(mk_ex(var("x"), mk_eq(leaf("x"), atom("zero")))).unwrap();
    contexts.push(kc.clone());
    let exists = kc.axiom(kc.axioms().len() - 1).unwrap();
    let kc = kc.choose(konst("w"), &exists).unwrap();
    contexts.push(kc);

    for pair in contexts.windows(2) {
        let (before, after) = (&pair[0], &pair[1]);

        assert!(after.extends(before));
        assert!(before.axioms().len() <= after.axioms().len());
        for (index, axiom) in before.axioms().iter().enumerate() {
            assert_eq!(&after.axioms()[index], axiom);
        }
        for (konst, def) in before.constants().iter() {
            let later = after.def(konst).unwrap();
            assert_eq!(later.head(), def.head());
            assert!(later.cases().len() >= def.cases().len());
            assert!(!def.is_sealed() || later.is_sealed());
        }
    }
}

#[test]
fn define_adds_the_defining_equation() {
    let f = konst("f");
    let kc = KernelContext::root()
        .declare(Head::nullary(konst("zero")))
        .unwrap()
        .declare(Head::new(f.clone(), vec![], vec![leaf("A")]).unwrap())
        .unwrap()
        .define(&f, vec![mk_eq(leaf("A"), atom("zero"))], atom("zero"), &never)
        .unwrap();

    let f_a = Term::constant(f.clone(), vec![], vec![leaf("A")]);
    assert_eq!(
        kc.axioms()[0],
        mk_imp(mk_eq(leaf("A"), atom("zero")), mk_eq(f_a, atom("zero"))),
    );
    assert_eq!(kc.def(&f).unwrap().cases().len(), 1);
}

#[test]
fn define_requires_parameters_only() {
    let f = konst("f");
    let kc = KernelContext::root()
        .declare(Head::new(f.clone(), vec![], vec![leaf("A")]).unwrap())
        .unwrap();

    assert_eq!(
        kc.define(&f, vec![], leaf("B"), &never).unwrap_err(),
        KernelError::NotCoveredByHead {
            constant: f.clone(),
            term: leaf("B"),
        },
    );
    assert_eq!(
        kc.define(&konst("g"), vec![], leaf("A"), &never).unwrap_err(),
        KernelError::UnknownConstant(konst("g")),
    );

    let sealed = kc.seal(&f).unwrap();
    assert_eq!(
        sealed.define(&f, vec![], leaf("A"), &never).unwrap_err(),
        KernelError::AlreadySealed(f),
    );
}

#[test]
fn contradicting_definitions_fail() {
    let f = konst("f");
    let kc = KernelContext::root()
        .declare(Head::nullary(konst("zero")))
        .unwrap()
        .declare(Head::new(f.clone(), vec![], vec![leaf("A")]).unwrap())
        .unwrap()
        .define(&f, vec![], leaf("A"), &never)
        .unwrap();

    let obligation = mk_eq(leaf("A"), atom("zero"));
    assert_eq!(
        kc.define(&f, vec![], atom("zero"), &never).unwrap_err(),
        KernelError::UnprovedObligation(obligation),
    );

    // a prover answering with an unrelated theorem does not help
    let cheat = |context: &KernelContext, _: &Term| context.axiom(0).ok();
    assert!(kc.define(&f, vec![], atom("zero"), &cheat).is_err());
}

#[test]
fn compatible_definitions_succeed() {
    let f = konst("f");
    let kc = KernelContext::root()
        .declare(Head::new(f.clone(), vec![], vec![leaf("A")]).unwrap())
        .unwrap()
        .define(&f, vec![], leaf("A"), &never)
        .unwrap()
        .assume(mk_imp(mk_eq(leaf("A"), leaf("A")), mk_eq(leaf("A"), leaf("A"))))
        .unwrap();

    // A = A ⟶ A = A discharges the overlap with the first case
    let kc = kc
        .define(&f, vec![mk_eq(leaf("A"), leaf("A"))], leaf("A"), &by_axiom)
        .unwrap();
    assert_eq!(kc.def(&f).unwrap().cases().len(), 2);
}
