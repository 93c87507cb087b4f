use criterion::{criterion_group, criterion_main, Criterion};
use sable::{Environment, Interpreter, Natives};
use std::cell::RefCell;
use std::io;
use std::rc::Rc;

fn benchmark(c: &mut Criterion) {
    let src = include_str!("../../data/fib.sable");
    let program = sable::parse(src).unwrap();
    let natives = Natives::standard(Rc::new(RefCell::new(io::sink())));

    c.bench_function("fib 20", |b| {
        b.iter(|| {
            let env = Rc::new(RefCell::new(Environment::global()));
            Interpreter::new(&natives, env).interpret(&program);
        })
    });
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
