//! End-to-end scenarios for scopes, handlers and forwarding.

use effectful::{
    effect, handle, handle_with_default, run, unhandled, Context, EffectError, FiberConfig,
    Handler, ScopeReport, ScopeStatus,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

effect! {
    pub struct Read -> String;
    pub struct Next -> String;
    pub struct Empty -> ();
    pub struct Fail -> ();
    pub struct Print(pub String) -> ();
    pub struct Get { pub key: String } -> Option<String>;
    pub struct Set { pub key: String, pub value: String } -> ();
}

async fn print(cx: &mut Context, msg: &str) -> Result<(), EffectError> {
    cx.perform(Print(msg.to_string())).await
}

#[test]
fn no_effects_returns_the_body_value() {
    let answer = run(
        async |_| Ok(42),
        async |_, handler: &mut Handler<i32>| handler.unhandled(),
    );
    assert_eq!(answer, Ok(42));
}

#[test]
fn simple_effect_resumes_with_handler_value() {
    let result = run(
        async |cx| {
            let prefix = cx.perform(Read).await?;
            Ok(format!("{prefix}: hello world!"))
        },
        async |effect, handler| {
            if effect.is::<Read>() {
                handler.resume("[info]".to_string()).await
            } else {
                handler.unhandled()
            }
        },
    );
    assert_eq!(result.unwrap(), "[info]: hello world!");
}

#[test]
fn next_effect_value_is_parsed_by_the_computation() {
    let result = run(
        async |cx| {
            cx.perform(Next)
                .await?
                .parse::<i32>()
                .map_err(|e| EffectError::failed(e.to_string()))
        },
        async |_, handler| handler.resume("42".to_string()).await,
    );
    assert_eq!(result, Ok(42));
}

#[test]
fn handler_returning_without_resume_aborts() {
    let reached_end = Arc::new(AtomicUsize::new(0));
    let flag = Arc::clone(&reached_end);

    let result = run(
        async move |cx| {
            cx.perform(Fail).await?;
            flag.fetch_add(1, Ordering::SeqCst);
            Ok(0)
        },
        async |effect, handler| {
            if effect.is::<Fail>() {
                Ok(42)
            } else {
                handler.unhandled()
            }
        },
    );

    assert_eq!(result, Ok(42));
    assert_eq!(reached_end.load(Ordering::SeqCst), 0);
}

#[test]
fn each_handler_adds_one_after_resume() {
    let result = run(
        async |cx| {
            cx.perform(Empty).await?;
            cx.perform(Empty).await?;
            cx.perform(Empty).await?;
            Ok(0)
        },
        async |_, handler| Ok(handler.resume(()).await? + 1),
    );
    assert_eq!(result, Ok(3));
}

#[test]
fn hundred_thousand_performs_each_add_one() {
    const PERFORMS: usize = 100_000;

    let scope = handle(async |cx| {
        for _ in 0..PERFORMS {
            cx.perform(Empty).await?;
        }
        Ok(0_usize)
    })
    .handler(async |_, handler| Ok(handler.resume(()).await? + 1))
    .config(FiberConfig::named("bulk"))
    .build()
    .unwrap();

    let (result, report) = scope.run_with_report();
    assert_eq!(result, Ok(PERFORMS));
    assert_eq!(report.handlers_invoked, PERFORMS);
    assert_eq!(report.discarded_handlers, 0);
    assert_eq!(
        report.history.times_entered(&ScopeStatus::PerformedEffect),
        PERFORMS
    );
}

#[test]
fn reverse_output_prints_after_resuming() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);

    run(
        async |cx| {
            print(cx, "A").await?;
            print(cx, "B").await?;
            print(cx, "C").await
        },
        async move |effect, handler| match effect.downcast_ref::<Print>() {
            Some(Print(msg)) => {
                handler.resume(()).await?;
                sink.lock().push(msg.clone());
                Ok(())
            }
            None => handler.unhandled(),
        },
    )
    .unwrap();

    assert_eq!(*log.lock(), vec!["C", "B", "A"]);
}

#[test]
fn reads_the_same_answer_twice() {
    let result = run(
        async |cx| {
            let first = cx.perform(Read).await?;
            let last = cx.perform(Read).await?;
            Ok(format!("Full Name: {first} {last}"))
        },
        async |_, handler| handler.resume("Bob".to_string()).await,
    );
    assert_eq!(result.unwrap(), "Full Name: Bob Bob");
}

#[test]
fn collecting_output_through_a_default_scope() {
    let result = run(
        async |cx| {
            cx.handle_with_default(async |cx| {
                print(cx, "A").await?;
                print(cx, "B").await?;
                print(cx, "C").await?;
                Ok(((), String::new()))
            })
        },
        async |effect, handler| match effect.downcast_ref::<Print>() {
            Some(Print(msg)) => {
                let ((), rest) = handler.resume(()).await?;
                Ok(((), format!("{msg}{rest}")))
            }
            None => handler.unhandled(),
        },
    );

    assert_eq!(result.unwrap().1, "ABC");
}

#[test]
fn state_handler_backs_an_email_database() {
    let database = Arc::new(Mutex::new(HashMap::from([
        ("bob".to_string(), "bob@tum.de".to_string()),
        ("alex".to_string(), "alex.12@tum.de".to_string()),
    ])));
    let store = Arc::clone(&database);

    let lines = run(
        async |cx| {
            let mut lines = Vec::new();
            for name in ["bob", "alex"] {
                let email = cx.perform(Get { key: name.to_string() }).await?;
                lines.push(format!("{name}: {email:?}"));
            }
            cx.perform(Set {
                key: "sofia".to_string(),
                value: "sofy.best@tum.de".to_string(),
            })
            .await?;
            let sofia = cx.perform(Get { key: "sofia".to_string() }).await?;
            lines.push(format!("sofia: {sofia:?}"));
            Ok(lines)
        },
        async move |effect, handler| {
            if let Some(Get { key }) = effect.downcast_ref::<Get>() {
                let email = store.lock().get(key).cloned();
                handler.resume(email).await
            } else if let Some(Set { key, value }) = effect.downcast_ref::<Set>() {
                store.lock().insert(key.clone(), value.clone());
                handler.resume(()).await
            } else {
                handler.unhandled()
            }
        },
    )
    .unwrap();

    assert_eq!(
        lines,
        vec![
            "bob: Some(\"bob@tum.de\")",
            "alex: Some(\"alex.12@tum.de\")",
            "sofia: Some(\"sofy.best@tum.de\")",
        ]
    );
    assert_eq!(database.lock().len(), 3);
}

#[test]
fn effects_forward_through_nested_declining_scopes() {
    let depths = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&depths);

    let result = run(
        async move |cx| {
            cx.run(
                async move |cx| {
                    cx.run(
                        async move |cx| {
                            seen.lock().push(cx.registry().depth());
                            cx.perform(Read).await
                        },
                        async |_, handler: &mut Handler<String>| handler.unhandled(),
                    )
                },
                async |_, _: &mut Handler<String>| unhandled(),
            )
        },
        async |effect, handler| {
            if effect.is::<Read>() {
                handler.resume("🇮🇹".to_string()).await
            } else {
                handler.unhandled()
            }
        },
    );

    assert_eq!(result.unwrap(), "🇮🇹");
    assert_eq!(*depths.lock(), vec![3]);
}

#[test]
fn effect_declined_by_every_enclosing_scope_is_fatal() {
    let innermost = Arc::new(Mutex::new(None::<ScopeReport>));
    let sink = Arc::clone(&innermost);

    let result = run(
        async move |cx| {
            cx.run(
                async move |cx| {
                    cx.run(
                        async move |cx| {
                            let (result, report) = cx
                                .handle(async |cx| cx.perform(Read).await)
                                .handler(async |_, handler| handler.unhandled())
                                .build()?
                                .run_with_report();
                            *sink.lock() = Some(report);
                            result
                        },
                        async |_, handler: &mut Handler<String>| handler.unhandled(),
                    )
                },
                async |_, handler: &mut Handler<String>| handler.unhandled(),
            )
        },
        async |_, handler: &mut Handler<String>| handler.unhandled(),
    );

    match result {
        Err(EffectError::UnhandledEffect { effect }) => assert!(effect.ends_with("Read")),
        other => panic!("expected an unhandled effect, got {other:?}"),
    }
    let report = innermost.lock().take().unwrap();
    assert_eq!(report.forwards, 4);
    assert_eq!(report.handlers_invoked, 4);
    assert_eq!(report.history.times_entered(&ScopeStatus::Forwarded), 4);
}

#[test]
fn inner_handler_wins_over_outer_for_the_same_effect() {
    let result = run(
        async |cx| {
            let inner = cx.run(
                async |cx| cx.perform(Read).await,
                async |_, handler: &mut Handler<String>| {
                    handler.resume("inner".to_string()).await
                },
            )?;
            let outer = cx.perform(Read).await?;
            Ok(format!("{inner}/{outer}"))
        },
        async |_, handler| handler.resume("outer".to_string()).await,
    );
    assert_eq!(result.unwrap(), "inner/outer");
}

#[test]
fn declined_effect_at_the_top_is_fatal() {
    let result = run(
        async |cx| cx.perform(Read).await,
        async |_, handler: &mut Handler<String>| handler.unhandled(),
    );
    match result {
        Err(EffectError::UnhandledEffect { effect }) => assert!(effect.ends_with("Read")),
        other => panic!("expected an unhandled effect, got {other:?}"),
    }
}

#[test]
fn handle_with_default_at_the_top_only_passes_pure_values() {
    assert_eq!(handle_with_default(async |_| Ok(1)), Ok(1));
    assert!(matches!(
        handle_with_default(async |cx| cx.perform(Empty).await),
        Err(EffectError::UnhandledEffect { .. })
    ));
}

#[test]
fn computation_sees_its_own_scope() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let scope = handle(async move |cx| {
        let outer = cx.scope_id();
        let inner = cx.handle_with_default(async |cx| Ok(cx.scope_id()))?;
        sink.lock().extend([outer, inner]);
        Ok(outer)
    })
    .default_handler()
    .build()
    .unwrap();
    let id = scope.id();

    assert_eq!(scope.run(), Ok(id));
    let seen = seen.lock();
    assert_eq!(seen[0], id);
    assert_ne!(seen[1], id);
}

#[test]
fn handler_failure_before_resume_fails_the_scope() {
    let result: Result<(), _> = run(
        async |cx| cx.perform(Empty).await,
        async |_, _| Err(EffectError::failed("handler exploded")),
    );
    assert_eq!(result, Err(EffectError::Failed("handler exploded".to_string())));
}

#[test]
fn handler_failure_after_resume_fails_the_scope() {
    let result: Result<i32, _> = run(
        async |cx| {
            cx.perform(Empty).await?;
            Ok(1)
        },
        async |_, handler| {
            handler.resume(()).await?;
            Err(EffectError::failed("late failure"))
        },
    );
    assert_eq!(result, Err(EffectError::Failed("late failure".to_string())));
}

#[test]
fn handler_can_recover_from_a_failed_computation() {
    let result = run(
        async |cx| {
            cx.perform(Empty).await?;
            Err(EffectError::failed("computation failed"))
        },
        async |_, handler| match handler.resume(()).await {
            Ok(value) => Ok(value),
            Err(EffectError::Failed(_)) => Ok(-1),
            Err(other) => Err(other),
        },
    );
    assert_eq!(result, Ok(-1));
}

#[test]
fn failed_result_skips_parked_handlers() {
    let woken = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&woken);

    let scope = handle(async |cx| {
        cx.perform(Empty).await?;
        cx.perform(Fail).await?;
        Ok(0)
    })
    .handler(async move |effect, handler| {
        if effect.is::<Fail>() {
            handler.resume(()).await?;
            return Err(EffectError::failed("second handler failed"));
        }
        let value = handler.resume(()).await?;
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    })
    .build()
    .unwrap();

    let (result, report) = scope.run_with_report();
    assert_eq!(
        result,
        Err(EffectError::Failed("second handler failed".to_string()))
    );
    assert_eq!(woken.load(Ordering::SeqCst), 0);
    assert_eq!(report.discarded_handlers, 1);
}

#[test]
fn panicking_computation_becomes_an_error() {
    let result: Result<i32, _> = run(
        async |_| panic!("computation blew up"),
        async |_, handler| handler.unhandled(),
    );
    match result {
        Err(EffectError::Panicked { message, .. }) => assert_eq!(message, "computation blew up"),
        other => panic!("expected a panic report, got {other:?}"),
    }
}

#[test]
fn panicking_handler_becomes_an_error() {
    let result: Result<i32, _> = run(
        async |cx| {
            cx.perform(Empty).await?;
            Ok(1)
        },
        async |_, _| panic!("handler blew up"),
    );
    assert!(matches!(result, Err(EffectError::Panicked { .. })));
}

#[test]
fn second_resume_is_rejected() {
    let result = run(
        async |cx| Ok(cx.perform(Read).await?.len()),
        async |_, handler| {
            let first = handler.resume("four".to_string()).await?;
            match handler.resume("again".to_string()).await {
                Err(EffectError::AlreadyResumed) => Ok(first * 10),
                _ => Ok(0),
            }
        },
    );
    assert_eq!(result, Ok(40));
}

#[test]
fn wrong_resume_type_leaves_the_continuation_usable() {
    let result = run(
        async |cx| cx.perform(Read).await,
        async |_, handler| {
            let err = handler.resume(7_u8).await.unwrap_err();
            assert!(matches!(err, EffectError::ResumeTypeMismatch { .. }));
            handler.resume("typed".to_string()).await
        },
    );
    assert_eq!(result.unwrap(), "typed");
}

#[test]
fn declining_after_resume_is_an_error() {
    let result: Result<(), _> = run(
        async |cx| cx.perform(Empty).await,
        async |_, handler| {
            handler.resume(()).await?;
            handler.unhandled()
        },
    );
    assert_eq!(result, Err(EffectError::UnhandledAfterResume));
}

#[test]
fn forwarded_handler_with_a_different_result_type_is_rejected() {
    let result: Result<String, _> = run(
        async |cx| {
            let len: usize =
                cx.handle_with_default(async |cx| Ok(cx.perform(Read).await?.len()))?;
            Ok(len.to_string())
        },
        async |_, handler| handler.resume("abc".to_string()).await,
    );
    assert!(matches!(
        result,
        Err(EffectError::ResultTypeMismatch { .. })
    ));
}

#[test]
fn outer_report_ignores_nested_performs() {
    let scope = handle(async |cx| {
        cx.handle_with_default(async |cx| {
            cx.perform(Empty).await?;
            Ok(1)
        })
    })
    .handler(async |_, handler| handler.resume(()).await)
    .build()
    .unwrap();

    let (result, report) = scope.run_with_report();
    assert_eq!(result, Ok(1));
    assert_eq!(report.final_status(), Some(&ScopeStatus::Computed));
    assert_eq!(
        report.history.get_path(),
        vec![&ScopeStatus::Initial, &ScopeStatus::Computed]
    );
    assert_eq!(report.handlers_invoked, 0);
    assert!(report.is_complete());
    assert!(report.to_json().unwrap().contains("Computed"));
}

#[test]
fn report_records_abort_path() {
    let scope = handle(async |cx| {
        cx.perform(Empty).await?;
        cx.perform(Fail).await?;
        Ok(0)
    })
    .handler(async |effect, handler| {
        if effect.is::<Fail>() {
            Ok(99)
        } else {
            handler.resume(()).await
        }
    })
    .build()
    .unwrap();

    let (result, report) = scope.run_with_report();
    assert_eq!(result, Ok(99));
    assert_eq!(report.handlers_invoked, 2);
    assert_eq!(report.discarded_handlers, 1);
    assert_eq!(report.history.times_entered(&ScopeStatus::PerformedEffect), 2);
    assert_eq!(report.final_status(), Some(&ScopeStatus::Aborted));
}

#[test]
fn parked_limit_caps_effect_heavy_scopes() {
    let result = handle(async |cx| {
        for _ in 0..10 {
            cx.perform(Empty).await?;
        }
        Ok(0)
    })
    .handler(async |_, handler| handler.resume(()).await)
    .config(FiberConfig::default().with_max_parked(4))
    .build()
    .unwrap()
    .run();

    assert!(matches!(
        result,
        Err(EffectError::ParkedLimit { limit: 4, .. })
    ));
}

#[test]
fn handler_sees_fresh_invocation_ids() {
    let ids = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&ids);

    run(
        async |cx| {
            cx.perform(Empty).await?;
            cx.perform(Empty).await
        },
        async move |_, handler| {
            assert!(handler.effect().is::<Empty>());
            sink.lock().push(handler.id());
            handler.resume(()).await
        },
    )
    .unwrap();

    let ids = ids.lock();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
}
