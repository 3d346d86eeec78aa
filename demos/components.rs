use sovran_typearray::{StoreError, TypeArray};

#[derive(Debug, Default, Clone, Copy)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Debug, Default, Clone, Copy)]
struct Velocity {
    dx: f32,
    dy: f32,
}

#[derive(Debug)]
struct Health(u32);

#[derive(Debug)]
struct Tag(&'static str);

/// Marker with no data; costs no arena bytes.
#[derive(Debug)]
struct Player;

/// Demonstrates using TypeArray as the component bag of a single entity
fn main() -> Result<(), StoreError> {
    // Reserve the components every entity has in one go, so they are packed
    // with as little padding as possible.
    let mut entity = TypeArray::new();
    let [pos, vel] = entity.reserve_bundle::<(Position, Velocity)>();
    println!("Position at offset {}, Velocity at offset {}", pos, vel);

    // Construct them later, once their values are known
    entity.try_construct(Position { x: 0.0, y: 0.0 })?;
    entity.try_construct(Velocity { dx: 1.5, dy: -0.5 })?;

    // Optional components come and go
    entity.insert_bundle((Health(100), Tag("goblin")));
    entity.insert(Player);

    // Simulate a few ticks using cached offsets
    for tick in 1..=3 {
        let velocity = *entity.get_at::<Velocity>(vel);
        let position = entity.get_at_mut::<Position>(pos);
        position.x += velocity.dx;
        position.y += velocity.dy;
        println!("tick {}: {:?}", tick, position);
    }

    // Take some damage
    entity.get_mut::<Health>().0 -= 30;

    // Read several components at once
    let (position, health, tag) = entity.get_many::<(Position, Health, Tag)>();
    println!("{} at ({}, {}) with {} hp", tag.0, position.x, position.y, health.0);

    // Remove the marker; its slot stays reserved and can be refilled later
    entity.destruct::<Player>();
    println!("is player: {}", entity.contains::<Player>());

    // Recoverable lookups
    match entity.try_get::<Player>() {
        Ok(_) => println!("still a player"),
        Err(e) => println!("lookup failed: {}", e),
    }
    entity.assign(Player);

    println!(
        "{} components in {} of {} arena bytes",
        entity.len(),
        entity.arena_len(),
        entity.arena_capacity()
    );
    println!("{:?}", entity);

    Ok(())
}
