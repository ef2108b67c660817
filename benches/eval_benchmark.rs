use criterion::{black_box, criterion_group, criterion_main, Criterion};
use expr_engine::{interp, EvalContext, Expression, Value};

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    let expressions = [
        ("arithmetic", "3*(4+5)-2^8/4"),
        ("relations", "1<2 && 3>=2 || !(4==5)"),
        ("sequences", "mean(uniq((1,2,2,3,4,4,5)))"),
        ("defines", "{f(x)=x*x, g(x)=f(x)+1}g(10)"),
    ];

    for (name, text) in expressions {
        group.bench_function(name, |b| {
            b.iter(|| Expression::new(black_box(text)).is_valid())
        });
    }
    group.finish();
}

fn bench_eval(c: &mut Criterion) {
    let mut group = c.benchmark_group("eval");

    let mut ctx = EvalContext::new();
    ctx.set_parameter("a", Value::Real(3.0));
    ctx.set_parameter("b", Value::Real(4.0));

    let expressions = [
        ("arithmetic", "3*(4+5)-2^8/4"),
        ("params", "[a]*[a]+[b]*[b]"),
        ("trig", "sin(1)+cos(1)+tan(1)"),
        ("statistics", "dev((2,4,4,4,5,5,7,9))"),
        ("user_function", "{f(x)=x*x}f(12)"),
        ("summation", "{f(x)=x}Σ(1,1000,f)"),
    ];

    for (name, text) in expressions {
        let parsed = Expression::new(text);
        assert!(parsed.is_valid(), "{} must parse", text);
        group.bench_function(name, |b| {
            b.iter(|| parsed.eval(black_box(&ctx)))
        });
    }
    group.finish();
}

fn bench_one_shot(c: &mut Criterion) {
    c.bench_function("interp_one_shot", |b| {
        b.iter(|| interp(black_box("(1+2)*3 - 4/5"), None))
    });
}

criterion_group!(benches, bench_parse, bench_eval, bench_one_shot);
criterion_main!(benches);
