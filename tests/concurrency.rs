//! Sharing one group across threads

use std::sync::{Arc, Barrier};
use std::thread;

use textplate::{TemplateGroup, Value};

const GROUP: &str = r#"
page(title, items) ::= <<
<title>
<items:row(); separator="\n">
<@footer>--<@end>
>>

row(item) ::= "* <item>"
"#;

#[test]
fn test_concurrent_first_lookup_compiles_once() {
    let group = Arc::new(TemplateGroup::from_source(GROUP).unwrap());
    let barrier = Arc::new(Barrier::new(8));

    let compiled: Vec<_> = (0..8)
        .map(|_| {
            let group = Arc::clone(&group);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                group.compiled("page").unwrap()
            })
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    for other in &compiled[1..] {
        assert!(Arc::ptr_eq(&compiled[0], other));
    }
}

#[test]
fn test_concurrent_renders_are_independent() {
    let group = TemplateGroup::from_source(GROUP).unwrap();

    thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|n| {
                let group = &group;
                scope.spawn(move || {
                    let mut page = group.instance_of("page").unwrap();
                    page.add("title", format!("Page {}", n)).unwrap();
                    page.add("items", Value::list((0..n).map(|i| i * 10)))
                        .unwrap();
                    (n, page.render().unwrap())
                })
            })
            .collect();

        for handle in handles {
            let (n, out) = handle.join().unwrap();
            let mut expected = format!("Page {}\n", n);
            for i in 0..n {
                if i > 0 {
                    expected.push('\n');
                }
                expected.push_str(&format!("* {}", i * 10));
            }
            expected.push_str("\n--");
            assert_eq!(out, expected);
        }
    });
}

#[test]
fn test_region_override_visible_to_other_threads() {
    let group = TemplateGroup::from_source(GROUP).unwrap();

    thread::scope(|scope| {
        scope
            .spawn(|| {
                group
                    .register_region_override("page", "footer", "== end of <title> ==")
                    .unwrap();
            })
            .join()
            .unwrap();

        let out = scope
            .spawn(|| {
                let mut page = group.instance_of("page").unwrap();
                page.add("title", "T").unwrap();
                page.add("items", Value::list(["a"])).unwrap();
                page.render().unwrap()
            })
            .join()
            .unwrap();
        assert_eq!(out, "T\n* a\n== end of T ==");
    });
}
