use common::{OrderId, TraceId, UserId};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use domain::{Order, OrderCreatedEvent, User, is_valid_email};

fn bench_order_validation(c: &mut Criterion) {
    c.bench_function("domain/order_new", |b| {
        b.iter(|| Order::new(black_box(UserId::new(1)), black_box(99.99)).unwrap());
    });

    c.bench_function("domain/order_new_rejected", |b| {
        b.iter(|| Order::new(black_box(UserId::new(1)), black_box(-10.0)).unwrap_err());
    });
}

fn bench_user_validation(c: &mut Criterion) {
    c.bench_function("domain/user_new", |b| {
        b.iter(|| User::new(black_box("John Doe"), black_box("john.doe@example.com")).unwrap());
    });

    c.bench_function("domain/email_check", |b| {
        b.iter(|| is_valid_email(black_box("jane.doe+orders@mail.example.co.uk")));
    });
}

fn bench_event_encoding(c: &mut Criterion) {
    let mut order = Order::new(UserId::new(1), 99.99).unwrap();
    order.id = OrderId::new(1);
    let trace_id = TraceId::generate();

    c.bench_function("domain/order_created_encode", |b| {
        b.iter(|| {
            OrderCreatedEvent::order_created(black_box(&order), &trace_id)
                .to_bytes()
                .unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_order_validation,
    bench_user_validation,
    bench_event_encoding
);
criterion_main!(benches);
