//! Parent-before-child ordering of scene objects

use std::collections::HashMap;

use crate::scene::SceneObject;

/// Marks every object whose parent chain loops back to itself
fn cycle_members(parents: &[Option<usize>]) -> Vec<bool> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        OnPath,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; parents.len()];
    let mut on_cycle = vec![false; parents.len()];
    let mut path = Vec::new();

    for start in 0..parents.len() {
        let mut cur = Some(start);
        while let Some(i) = cur {
            match marks[i] {
                Mark::Done => break,
                Mark::OnPath => {
                    // Everything on the path from the first visit of `i` loops
                    if let Some(pos) = path.iter().position(|&p| p == i) {
                        for &p in &path[pos..] {
                            on_cycle[p] = true;
                        }
                    }
                    break;
                }
                Mark::Unvisited => {
                    marks[i] = Mark::OnPath;
                    path.push(i);
                    cur = parents[i];
                }
            }
        }
        for p in path.drain(..) {
            marks[p] = Mark::Done;
        }
    }
    on_cycle
}

/// Order objects so each parent precedes its children.
///
/// Missing parents impose no constraint. Objects on a parent cycle ignore
/// their parent edge and keep declaration order among themselves. Every
/// object appears exactly once.
pub fn dependency_order(objects: &[SceneObject]) -> Vec<&SceneObject> {
    // Reverse so the first declaration of a duplicated id wins
    let index: HashMap<&str, usize> = objects
        .iter()
        .enumerate()
        .rev()
        .map(|(i, o)| (o.id.as_str(), i))
        .collect();
    let parents: Vec<Option<usize>> = objects
        .iter()
        .map(|o| o.parent.as_deref().and_then(|p| index.get(p).copied()))
        .collect();
    let on_cycle = cycle_members(&parents);
    if on_cycle.iter().any(|&c| c) {
        log::debug!("parent cycle detected; cyclic objects keep declaration order");
    }

    let mut placed = vec![false; objects.len()];
    let mut order = Vec::with_capacity(objects.len());
    let mut chain = Vec::new();

    for start in 0..objects.len() {
        let mut cur = Some(start);
        while let Some(i) = cur {
            if placed[i] {
                break;
            }
            chain.push(i);
            cur = if on_cycle[i] { None } else { parents[i] };
        }
        for i in chain.drain(..).rev() {
            placed[i] = true;
            order.push(&objects[i]);
        }
    }
    order
}
